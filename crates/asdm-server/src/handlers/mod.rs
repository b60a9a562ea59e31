//! HTTP request handlers.

pub(crate) mod config;
pub(crate) mod i18n;
pub(crate) mod navigation;
pub(crate) mod pages;

/// Convert internal path (without leading slash) to URL path (with leading slash).
///
/// Sites store route paths without leading slashes (e.g., "guide", "guide/setup", "" for
/// the section home), but the frontend expects URL paths with leading slashes.
pub(crate) fn to_url_path(path: &str) -> String {
    if path.is_empty() {
        "/".to_owned()
    } else {
        format!("/{path}")
    }
}
