//! End-to-end tests of the property pipeline.
//!
//! Each test builds a real [`BuildContext`] from configuration layers and a
//! mock extractor, then checks what the build publishes.

use std::path::Path;

use tempfile::TempDir;

use gitstamp::core::config::{Config, ConfigError, ConfigLayer};
use gitstamp::core::settings::ProjectContext;
use gitstamp::core::types::PropertyMap;
use gitstamp::engine::{BuildContext, GenerationTask, PublishError, TaskOutcome};
use gitstamp::extract::{ExtractError, ExtractionFailure, MockExtractor};

fn raw() -> PropertyMap {
    [
        ("git.commit.id", "abc123"),
        ("git.build.time", "2024-01-01T00:00:00Z"),
        ("git.build.user.email", "x@y.com"),
    ]
    .into_iter()
    .collect()
}

fn layer(toml_text: &str) -> ConfigLayer {
    let mut layer: ConfigLayer = toml::from_str(toml_text).unwrap();
    if layer.git.dot_git_directory.is_none() {
        layer.git.dot_git_directory = Some(".git".into());
    }
    layer
}

fn build(base: &Path, toml_text: &str, mock: &MockExtractor) -> Result<BuildContext, ConfigError> {
    BuildContext::new(
        &Config::from_layers(ConfigLayer::default(), Some(layer(toml_text))),
        ProjectContext::new("app", base),
        Box::new(mock.clone()),
    )
}

fn published(toml_text: &str, mock: &MockExtractor) -> PropertyMap {
    let dir = TempDir::new().unwrap();
    let ctx = build(dir.path(), toml_text, mock).unwrap();
    ctx.git_properties().to_map().unwrap()
}

mod publishing {
    use super::*;

    #[test]
    fn exclude_rule_drops_user_properties() {
        let out = published(
            "[filter]\nexclude_properties = [\"git.build.user.*\"]",
            &MockExtractor::new(raw()),
        );
        let expected: PropertyMap = [("git.commit.id", "abc123"), ("git.build.time", "")]
            .into_iter()
            .collect();
        assert_eq!(out, expected);
    }

    #[test]
    fn include_rule_keeps_only_commit_properties() {
        let out = published(
            "[filter]\ninclude_only_properties = [\"git.commit.*\"]",
            &MockExtractor::new(raw()),
        );
        let keys: Vec<&str> = out.keys().collect();
        assert_eq!(keys, vec!["git.commit.id"]);
    }

    #[test]
    fn without_rules_only_build_time_is_blanked() {
        let out = published("", &MockExtractor::new(raw()));
        let mut expected = raw();
        expected.insert("git.build.time", "");
        assert_eq!(out, expected);
    }

    #[test]
    fn invalid_abbrev_length_fails_before_extraction() {
        for value in ["0", "-1"] {
            let dir = TempDir::new().unwrap();
            let mock = MockExtractor::new(raw());
            let err = build(dir.path(), &format!("[git]\nabbrev_length = {}", value), &mock)
                .unwrap_err();
            assert!(matches!(err, ConfigError::InvalidValue(_)), "{}", value);
            assert_eq!(mock.call_count(), 0);
        }
    }

    #[test]
    fn tolerated_missing_git_directory_publishes_nothing() {
        let mock = MockExtractor::failing(ExtractError::NoGitDirectory {
            path: "/nowhere/.git".into(),
        });
        let out = published("[git]\nfail_on_no_git_directory = false", &mock);
        assert!(out.is_empty());
    }
}

mod regex_semantics {
    use super::*;

    #[test]
    fn dot_matches_any_character() {
        let props: PropertyMap = [("gitXcommitXid", "1"), ("git.branch", "main")]
            .into_iter()
            .collect();
        let out = published(
            "[filter]\ninclude_only_properties = [\"git.commit\"]",
            &MockExtractor::new(props),
        );
        assert!(out.contains_key("gitXcommitXid"));
        assert!(!out.contains_key("git.branch"));
    }

    #[test]
    fn rules_match_anywhere_in_key() {
        let out = published(
            "[filter]\nexclude_properties = [\"email\"]",
            &MockExtractor::new(raw()),
        );
        assert!(!out.contains_key("git.build.user.email"));
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn exclude_beats_include() {
        let out = published(
            "[filter]\ninclude_only_properties = [\"^git\\\\.build\"]\nexclude_properties = [\"time$\"]",
            &MockExtractor::new(raw()),
        );
        let keys: Vec<&str> = out.keys().collect();
        assert_eq!(keys, vec!["git.build.user.email"]);
    }
}

mod memoization {
    use super::*;

    #[test]
    fn task_and_queries_share_one_extraction() {
        let dir = TempDir::new().unwrap();
        let mock = MockExtractor::new(raw());
        let ctx = build(dir.path(), "", &mock).unwrap();

        let outcome = GenerationTask::new().run(&ctx).unwrap();
        let bag = ctx.git_properties();
        assert_eq!(bag.get("git.commit.id").unwrap().as_deref(), Some("abc123"));
        assert_eq!(bag.get_or("git.tags", "none").unwrap(), "none");

        assert_eq!(outcome.properties(), Some(&bag.to_map().unwrap()));
        assert_eq!(mock.call_count(), 1);
    }

    #[test]
    fn each_build_extracts_again() {
        let dir = TempDir::new().unwrap();
        let mock = MockExtractor::new(raw());

        for _ in 0..3 {
            let ctx = build(dir.path(), "", &mock).unwrap();
            ctx.git_properties().keys().unwrap();
        }
        assert_eq!(mock.call_count(), 3);
    }
}

mod failures {
    use super::*;

    #[test]
    fn fatal_failure_names_directory_and_reference() {
        let dir = TempDir::new().unwrap();
        let mock = MockExtractor::failing(ExtractError::NoGitDirectory {
            path: dir.path().join(".git"),
        });
        let ctx = build(dir.path(), "[git]\nevaluate_on_commit = \"release\"", &mock).unwrap();

        let err = ctx.git_properties().get("git.branch").unwrap_err();
        let PublishError::Extraction(ExtractionFailure::NoGitDirectory { path, reference }) = &err
        else {
            panic!("unexpected error: {:?}", err);
        };
        assert_eq!(path, &dir.path().join(".git"));
        assert_eq!(reference, "release");
    }

    #[test]
    fn skipped_task_tolerates_broken_extractor() {
        let dir = TempDir::new().unwrap();
        let mock = MockExtractor::failing(ExtractError::execution("boom"));
        let ctx = build(dir.path(), "skip = true", &mock).unwrap();

        assert_eq!(GenerationTask::new().run(&ctx).unwrap(), TaskOutcome::Skipped);
        assert_eq!(mock.call_count(), 0);
    }
}
