//! Content source abstraction for the ASDM site engine.
//!
//! Everything the site engine reads (site manifests, Markdown documents,
//! translation bundles) is addressed by a **location**: a slash-separated
//! path such as `/docs/en-us/site-tree.yml`. This crate provides:
//!
//! - [`ContentSource`] trait with a single blocking `read()` method
//! - [`FsSource`] reading locations below a local directory
//! - [`HttpSource`] fetching locations relative to a base URL
//! - [`MockSource`] for testing (behind `mock` feature flag)
//!
//! # Example
//!
//! ```ignore
//! use std::path::PathBuf;
//! use asdm_source::{ContentSource, FsSource};
//!
//! let source = FsSource::new(PathBuf::from("public"));
//! let manifest = source.read("/docs/en-us/site-tree.yml")?;
//! ```

mod fs;
mod http;
#[cfg(feature = "mock")]
mod mock;
mod source;

pub use fs::FsSource;
pub use http::HttpSource;
#[cfg(feature = "mock")]
pub use mock::MockSource;
pub use source::{ContentSource, ErrorStatus, SourceError, SourceErrorKind, join_location};
