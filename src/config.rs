/// Application-level constants
pub const APP_NAME: &str = "catalog-curator";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log filter used when `RUST_LOG` is not set.
///
/// Per-image metrics are logged at `debug`, curation outcomes at `info`.
pub fn default_log_filter() -> &'static str {
    "catalog_curator=info"
}
