mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use masker_config::Config;

fn main() -> Result<()> {
    // Read the local offset while the process is still single-threaded
    masker_docs::init_local_offset();

    tokio::runtime::Runtime::new()?.block_on(run())
}

async fn run() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = cli::Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        cli::Commands::Serve { service } => commands::serve::handle(service, &config).await,
        cli::Commands::Mask {
            text,
            labels,
            custom,
            max_chunk_len,
        } => commands::mask::handle(&config, text, labels, custom, max_chunk_len).await,
        cli::Commands::Process {
            file,
            labels,
            custom,
            max_chunk_len,
            return_pdf,
            out,
            remote,
        } => {
            let args = commands::process::ProcessArgs {
                file,
                labels,
                custom,
                max_chunk_len,
                return_pdf,
                out,
                remote,
            };
            commands::process::handle(&config, args).await
        }
    }
}
