//! core
//!
//! Domain types, configuration, and the pure property transforms.
//!
//! # Modules
//!
//! - [`types`] - PropertyMap and Fingerprint
//! - [`config`] - Layered configuration schema and loading
//! - [`settings`] - Resolved, validated settings snapshot
//! - [`filter`] - Include/exclude rules over property keys
//! - [`stabilize`] - Blanking of volatile properties
//! - [`paths`] - Path routing for project files
//!
//! Nothing here talks to an extractor. Filtering and stabilization are
//! total functions over a [`types::PropertyMap`].

pub mod config;
pub mod filter;
pub mod paths;
pub mod settings;
pub mod stabilize;
pub mod types;
