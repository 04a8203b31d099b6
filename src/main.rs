// src/main.rs

use clap::Parser;
use log::LevelFilter;
use log4rs::{
    append::console::{ConsoleAppender, Target},
    append::file::FileAppender,
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
    Config,
};
use serde::Serialize;
use std::fs;
use wp_content::config::{Command, CommandLineInput, RunConfig};
use wp_content::{
    AppError, ContentRepository, PostFilter, RequestError, RetryOrchestrator, TermFilter,
    WordPressClient,
};

/// Sets up logging configuration.
///
/// Logs go to stderr and a file in the temp dir; stdout is reserved for
/// JSON output.
fn setup_logging(verbose: bool) -> Result<(), AppError> {
    let log_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    let log_file_path = std::env::temp_dir().join("wp_content.log");
    if let Some(parent) = log_file_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let pattern = if verbose {
        "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}"
    } else {
        "{m}{n}"
    };

    let stderr_appender = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(pattern)))
        .build();

    let file_appender = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} [{l}] {t} - {m}{n}",
        )))
        .build(&log_file_path)?;

    let config = Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr_appender)))
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(LevelFilter::Debug)))
                .build("file", Box::new(file_appender)),
        )
        .build(
            Root::builder()
                .appender("stderr")
                .appender("file")
                .build(log_level),
        )
        .map_err(|e| AppError::Logging(e.to_string()))?;

    log4rs::init_config(config).map_err(|e| AppError::Logging(e.to_string()))?;
    log::info!("Logging initialized. Log file: {}", log_file_path.display());
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Runs one command against the site, retrying it at the call site.
async fn execute_command(config: &RunConfig) -> Result<(), AppError> {
    let client = WordPressClient::new(config.client.clone())?;
    let retry = RetryOrchestrator::<RequestError>::new(config.retry.clone())
        .on_max_attempts_reached(|err| {
            log::error!("Giving up [{}]: {}", err.code(), err);
        });

    let outcome = match &config.command {
        Command::Posts {
            page,
            per_page,
            categories,
            tags,
        } => {
            let filter = PostFilter::new()
                .page(*page)
                .per_page(*per_page)
                .categories(categories.clone())
                .tags(tags.clone());
            let page = retry.execute(|| client.list_posts(&filter)).await?;
            log::info!(
                "Page {}/{} ({} posts in total)",
                page.current_page,
                page.total_pages,
                page.total_items
            );
            print_json(&page)
        }
        Command::Post { id_or_slug } => {
            let post = retry.execute(|| client.resolve_post(id_or_slug)).await?;
            print_json(&post)
        }
        Command::Search { term, page } => {
            let filter = PostFilter::new().page(*page);
            let results = retry.execute(|| client.search_posts(term, &filter)).await?;
            print_json(&results)
        }
        Command::Categories => {
            let filter = TermFilter::new();
            print_json(&retry.execute(|| client.list_categories(&filter)).await?)
        }
        Command::Tags => {
            let filter = TermFilter::new();
            print_json(&retry.execute(|| client.list_tags(&filter)).await?)
        }
        Command::Authors => print_json(&retry.execute(|| client.list_authors()).await?),
        Command::Author { id } => print_json(&retry.execute(|| client.get_author(*id)).await?),
        Command::Media { id } => print_json(&retry.execute(|| client.get_media(*id)).await?),
        Command::Health => {
            let healthy = client.health_check().await;
            print_json(&serde_json::json!({
                "base_url": config.client.base_url.as_str(),
                "healthy": healthy,
            }))
        }
    };

    client.dispose();
    outcome
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CommandLineInput::parse();

    setup_logging(cli.verbose)?;

    let config = RunConfig::resolve(cli)?;

    execute_command(&config).await?;

    Ok(())
}
