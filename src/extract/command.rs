//! extract::command
//!
//! Out-of-process extractor speaking JSON over stdio.
//!
//! # Protocol
//!
//! The command runs with the project base directory as its working
//! directory. It receives one [`ExtractionRequest`] as JSON on stdin and
//! answers on stdout with exactly one of:
//!
//! ```json
//! {"properties": {"git.commit.id": "0a1b2c3", "git.branch": "main"}}
//! {"error": {"kind": "no_git_directory", "path": "/work/app/.git"}}
//! {"error": {"kind": "execution", "message": "bad object HEAD"}}
//! {"error": {"kind": "timeout", "timeout_ms": 30000}}
//! ```
//!
//! Anything written to stderr is forwarded line by line to the
//! extractor log. A non-zero exit without a parseable answer is an
//! execution error carrying the stderr text.

use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use serde::Deserialize;

use super::traits::{ExtractError, ExtractionCallback, ExtractionRequest, Extractor};
use crate::core::types::PropertyMap;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Runs an external program to extract properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandExtractor {
    program: String,
    args: Vec<String>,
    timeout: Option<Duration>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Response {
    Properties(PropertyMap),
    Error(WireError),
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum WireError {
    NoGitDirectory { path: PathBuf },
    Execution { message: String },
    Timeout { timeout_ms: u64 },
}

impl From<WireError> for ExtractError {
    fn from(err: WireError) -> Self {
        match err {
            WireError::NoGitDirectory { path } => ExtractError::NoGitDirectory { path },
            WireError::Execution { message } => ExtractError::Execution { message },
            WireError::Timeout { timeout_ms } => ExtractError::Timeout { timeout_ms },
        }
    }
}

impl CommandExtractor {
    /// Build from a shell-style command line, e.g. `"git-props --fast"`.
    ///
    /// # Errors
    ///
    /// Fails when the line cannot be split or names no program.
    pub fn parse(command_line: &str) -> Result<Self, ExtractError> {
        let mut words = shell_words::split(command_line).map_err(|e| {
            ExtractError::execution(format!("cannot parse extractor command '{}': {}", command_line, e))
        })?;
        if words.is_empty() {
            return Err(ExtractError::execution("extractor command is empty"));
        }
        let program = words.remove(0);
        Ok(Self {
            program,
            args: words,
            timeout: None,
        })
    }

    /// Kill the command if it runs longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The program that will be executed.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments passed to the program.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    fn spawn(&self, callback: &dyn ExtractionCallback) -> Result<Child, ExtractError> {
        Command::new(&self.program)
            .args(&self.args)
            .current_dir(callback.project_base_dir())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                ExtractError::execution(format!("failed to run extractor '{}': {}", self.program, e))
            })
    }
}

impl Extractor for CommandExtractor {
    fn extract(&self, callback: &dyn ExtractionCallback) -> Result<PropertyMap, ExtractError> {
        let request = ExtractionRequest::from_callback(callback);
        let input = serde_json::to_vec(&request)
            .map_err(|e| ExtractError::execution(format!("failed to encode request: {}", e)))?;

        let log = callback.log();
        log.debug(&format!("running extractor '{}'", self.program));

        let mut child = self.spawn(callback)?;
        let stdin = feed(child.stdin.take(), input);
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = wait(&mut child, self.timeout)?;
        if let Some(Err(e)) = stdin.and_then(|h| h.join().ok()) {
            return Err(ExtractError::execution(format!(
                "failed to write extractor input: {}",
                e
            )));
        }
        let stdout = join(stdout);
        let stderr = join(stderr);

        for line in stderr.lines().filter(|l| !l.trim().is_empty()) {
            log.info(line);
        }

        match serde_json::from_str::<Response>(stdout.trim()) {
            Ok(Response::Properties(props)) => Ok(props),
            Ok(Response::Error(err)) => Err(err.into()),
            Err(parse) if status.success() => Err(ExtractError::execution(format!(
                "extractor '{}' returned malformed output: {}",
                self.program, parse
            ))),
            Err(_) => Err(ExtractError::execution(format!(
                "extractor '{}' exited with {}: {}",
                self.program,
                status,
                stderr.trim()
            ))),
        }
    }
}

/// Write `input` and close the pipe. A command that exits without
/// reading its input is not an error.
fn feed<W: Write + Send + 'static>(
    pipe: Option<W>,
    input: Vec<u8>,
) -> Option<JoinHandle<io::Result<()>>> {
    pipe.map(|mut pipe| {
        thread::spawn(move || match pipe.write_all(&input) {
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
            other => other,
        })
    })
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<String>> {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            String::from_utf8_lossy(&buf).into_owned()
        })
    })
}

fn join(handle: Option<JoinHandle<String>>) -> String {
    handle.and_then(|h| h.join().ok()).unwrap_or_default()
}

fn wait(child: &mut Child, timeout: Option<Duration>) -> Result<ExitStatus, ExtractError> {
    let Some(timeout) = timeout else {
        return child
            .wait()
            .map_err(|e| ExtractError::execution(format!("failed to wait for extractor: {}", e)));
    };

    let start = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) if start.elapsed() >= timeout => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(ExtractError::Timeout {
                    timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                });
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => {
                return Err(ExtractError::execution(format!(
                    "failed to wait for extractor: {}",
                    e
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_splits_words() {
        let cmd = CommandExtractor::parse("props-tool --mode 'fast path'").unwrap();
        assert_eq!(cmd.program(), "props-tool");
        assert_eq!(cmd.args(), &["--mode".to_string(), "fast path".to_string()]);
    }

    #[test]
    fn parse_rejects_empty_and_unbalanced() {
        assert!(CommandExtractor::parse("   ").is_err());
        assert!(CommandExtractor::parse("tool 'oops").is_err());
    }

    #[test]
    fn wire_errors_map_to_extract_errors() {
        let resp: Response =
            serde_json::from_str(r#"{"error":{"kind":"no_git_directory","path":"/x/.git"}}"#).unwrap();
        let Response::Error(err) = resp else {
            panic!("expected error response");
        };
        assert_eq!(
            ExtractError::from(err),
            ExtractError::NoGitDirectory {
                path: PathBuf::from("/x/.git")
            }
        );
    }

    #[cfg(unix)]
    mod process {
        use super::*;
        use crate::core::config::ConfigLayer;
        use crate::core::settings::{ProjectContext, Settings};
        use crate::extract::adapter::SettingsCallback;

        fn settings(dir: &std::path::Path) -> Settings {
            let mut layer = ConfigLayer::default();
            layer.git.dot_git_directory = Some(".git".into());
            Settings::from_layer(layer, ProjectContext::new("app", dir)).unwrap()
        }

        fn run(script: &str) -> Result<PropertyMap, ExtractError> {
            let dir = tempfile::tempdir().unwrap();
            let s = settings(dir.path());
            let cmd = CommandExtractor {
                program: "sh".to_string(),
                args: vec!["-c".to_string(), script.to_string()],
                timeout: Some(Duration::from_secs(10)),
            };
            cmd.extract(&SettingsCallback::new(&s))
        }

        #[test]
        fn properties_response() {
            let props = run(r#"cat >/dev/null; echo '{"properties":{"git.branch":"main"}}'"#).unwrap();
            assert_eq!(props.get("git.branch"), Some("main"));
        }

        #[test]
        fn request_is_sent_on_stdin() {
            let props = run(
                r#"grep -q '"evaluate_on_commit":"HEAD"' && echo '{"properties":{"ok":"yes"}}'"#,
            )
            .unwrap();
            assert_eq!(props.get("ok"), Some("yes"));
        }

        #[test]
        fn runs_in_project_directory() {
            let dir = tempfile::tempdir().unwrap();
            std::fs::write(dir.path().join("marker"), "").unwrap();
            let s = settings(dir.path());
            let cmd = CommandExtractor::parse(
                r#"sh -c "test -f marker && echo '{\"properties\":{}}'""#,
            )
            .unwrap();
            assert!(cmd.extract(&SettingsCallback::new(&s)).unwrap().is_empty());
        }

        #[test]
        fn error_response() {
            let err = run(r#"echo '{"error":{"kind":"execution","message":"bad object"}}'"#).unwrap_err();
            assert_eq!(err, ExtractError::execution("bad object"));
        }

        #[test]
        fn failed_exit_reports_stderr() {
            let err = run("echo 'repository is corrupt' >&2; exit 3").unwrap_err();
            let message = err.to_string();
            assert!(message.contains("repository is corrupt"));
        }

        #[test]
        fn malformed_output() {
            let err = run("echo not-json").unwrap_err();
            assert!(err.to_string().contains("malformed"));
        }

        #[test]
        fn timeout_kills_command() {
            let dir = tempfile::tempdir().unwrap();
            let s = settings(dir.path());
            let cmd = CommandExtractor::parse("sleep 5")
                .unwrap()
                .with_timeout(Duration::from_millis(100));
            let err = cmd.extract(&SettingsCallback::new(&s)).unwrap_err();
            assert_eq!(err, ExtractError::Timeout { timeout_ms: 100 });
        }

        /// Settings whose serialized request is far larger than a pipe buffer.
        fn large_request(dir: &std::path::Path) -> Settings {
            let mut layer = ConfigLayer::default();
            layer.git.dot_git_directory = Some(".git".into());
            layer.format.date_format = Some("y".repeat(200 * 1024));
            Settings::from_layer(layer, ProjectContext::new("app", dir)).unwrap()
        }

        #[test]
        fn timeout_holds_for_unread_large_request() {
            let dir = tempfile::tempdir().unwrap();
            let s = large_request(dir.path());
            let cmd = CommandExtractor::parse("sleep 3")
                .unwrap()
                .with_timeout(Duration::from_millis(200));

            let start = Instant::now();
            let err = cmd.extract(&SettingsCallback::new(&s)).unwrap_err();
            assert_eq!(err, ExtractError::Timeout { timeout_ms: 200 });
            assert!(start.elapsed() < Duration::from_secs(2));
        }

        #[test]
        fn large_request_is_delivered() {
            let dir = tempfile::tempdir().unwrap();
            let s = large_request(dir.path());
            let cmd = CommandExtractor {
                program: "sh".to_string(),
                args: vec![
                    "-c".to_string(),
                    r#"n=$(wc -c | tr -d ' '); echo "{\"properties\":{\"size\":\"$n\"}}""#.to_string(),
                ],
                timeout: Some(Duration::from_secs(10)),
            };

            let props = cmd.extract(&SettingsCallback::new(&s)).unwrap();
            let size: usize = props.get("size").unwrap().parse().unwrap();
            assert!(size > 200 * 1024);
        }

        #[test]
        fn missing_program() {
            let dir = tempfile::tempdir().unwrap();
            let s = settings(dir.path());
            let cmd = CommandExtractor::parse("gitstamp-no-such-extractor").unwrap();
            let err = cmd.extract(&SettingsCallback::new(&s)).unwrap_err();
            assert!(err.to_string().contains("failed to run extractor"));
        }
    }
}
