//! KT Tutor - Main entry point.

use anyhow::Result;
use kt_common::config::Config;
use kt_common::logging::init_logging;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration (.env, config file, environment overrides)
    let config = Config::load_and_validate()?;

    // Initialize logging
    init_logging(&config.observability.log_level, &config.observability.log_format);

    tracing::info!("KT Tutor v{}", env!("CARGO_PKG_VERSION"));

    kt_tutor::start_server(&config).await
}
