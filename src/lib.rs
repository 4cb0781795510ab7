pub mod cli;
pub mod core;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::core::error::InstallerResult;

/// Structured logging to stderr, leaving stdout to command output.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,mrpack_installer_lib=debug")),
        )
        .with_writer(std::io::stderr)
        .init();
}

pub async fn run() -> InstallerResult<()> {
    let cli = Cli::parse();
    init_tracing();

    tracing::info!("mrpack installer {} starting...", env!("CARGO_PKG_VERSION"));
    cli::handle(cli).await
}
