use anyhow::Context;
use bili_archiver::{
    cli::{Args, Commands},
    commands::CommandExecutor,
    config::AppConfig,
    logging::{LoggingOptions, init_logging},
};
use clap::Parser;
use tracing::{debug, error};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let mut config = AppConfig::load(args.config.as_deref()).context("loading configuration")?;
    args.apply_overrides(&mut config);
    config.validate()?;

    let _log_guard = init_logging(LoggingOptions {
        verbose: args.verbose,
        quiet: args.quiet,
        filter: config.log_filter.as_deref(),
        log_dir: config.log_dir.as_deref(),
    })?;
    debug!(
        output_root = %config.output_root.display(),
        ffmpeg = %config.ffmpeg_path,
        "Configuration loaded"
    );

    let executor = CommandExecutor::new(config);
    let result = match args.command {
        Commands::Search {
            keyword,
            max_pages,
            no_resolve,
            only_author,
        } => executor
            .search(&keyword, max_pages, no_resolve, only_author)
            .await
            .map(|_| ()),
        Commands::DownloadUper { author, refresh } => {
            executor.download_uper(&author, refresh).await.map(|_| ())
        }
        Commands::Download {
            id,
            page,
            dir,
            output,
        } => executor.download(&id, page, dir, output).await.map(|_| ()),
        Commands::List { author, pending } => executor.list(&author, pending).await,
    };

    if let Err(e) = &result {
        error!(error = %e, "Command failed");
    }
    Ok(result?)
}
