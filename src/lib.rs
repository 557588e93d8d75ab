pub mod config;
pub mod curation; // Ranking, replacement decisions, catalog survey
pub mod curation_config;
pub mod scoring; // Pixel statistics, quality and artifact scores

pub use curation::{
    curate, decide, rank, select_thumbnail_source, Candidate, Decision, ReplacementPolicy,
    Workflow,
};
pub use curation_config::{ConfigError, CurationConfig};
pub use scoring::{DecodeError, PixelMetrics};

use tracing_subscriber::EnvFilter;

/// Install the fmt subscriber for driver binaries.
///
/// `RUST_LOG` overrides the default filter. A host that already installed a
/// subscriber keeps it.
pub fn init_tracing() {
    let result = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init();

    if result.is_ok() {
        tracing::info!("{} v{} logging initialized", config::APP_NAME, config::APP_VERSION);
    }
}
