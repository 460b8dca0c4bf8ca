use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::future::Future;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use yt_insights::cli::{Cli, Commands};
use yt_insights::config::Config;
use yt_insights::output;
use yt_insights::pipeline::{InsightsPipeline, PipelineInput};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(&cli);

    if let Err(err) = run(cli).await {
        eprintln!("{} {:#}", console::style("Error:").red().bold(), err);
        std::process::exit(1);
    }
}

fn init_tracing(cli: &Cli) {
    let default_filter = if cli.verbose {
        "yt_insights=debug"
    } else {
        "yt_insights=info"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;

    match cli.command {
        Commands::Summarize {
            input,
            text,
            file,
            languages,
            output,
            format,
        } => {
            let input = match (file, input) {
                (Some(path), _) => PipelineInput::RawText(
                    fs_err::read_to_string(&path).context("Failed to read transcript file")?,
                ),
                (None, Some(input)) if text => PipelineInput::RawText(input),
                (None, Some(input)) => PipelineInput::VideoUrl(input),
                (None, None) => anyhow::bail!("Please provide a video URL, transcript text or --file"),
            };

            let source = match &input {
                PipelineInput::VideoUrl(url) => url.trim().to_string(),
                PipelineInput::RawText(_) => "text".to_string(),
            };

            input.ensure_not_blank()?;
            let pipeline = InsightsPipeline::new(&config)?.with_languages(languages);

            tracing::info!("Starting summary for {}", source);
            let summary = with_spinner(cli.quiet, "Generating insights...", pipeline.run(input)).await?;

            let content = output::format_summary(&summary, &source, &format, chrono::Utc::now())?;
            match output {
                Some(path) => {
                    output::save_to_file(&content, &path)?;
                    println!("Summary saved to: {}", path.display());
                }
                None => output::print_to_console(&content),
            }
        }
        Commands::Transcript {
            url,
            languages,
            output,
        } => {
            let pipeline = InsightsPipeline::transcript_only(&config)?.with_languages(languages);

            let transcript = with_spinner(
                cli.quiet,
                "Fetching transcript...",
                pipeline.transcript(PipelineInput::VideoUrl(url)),
            )
            .await?;

            match output {
                Some(path) => {
                    output::save_to_file(transcript.as_str(), &path)?;
                    println!("Transcript saved to: {}", path.display());
                }
                None => output::print_to_console(transcript.as_str()),
            }
        }
        Commands::Config { show, init } => {
            if init {
                let path = Config::init()?;
                println!("Configuration written to: {}", path.display());
            } else if show {
                config.display();
            } else {
                println!("Config file: {}", Config::config_path()?.display());
            }
        }
    }

    Ok(())
}

/// Drive a future while showing a spinner on stderr
async fn with_spinner<T>(quiet: bool, message: &'static str, fut: impl Future<Output = T>) -> T {
    if quiet {
        return fut.await;
    }

    let progress = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}") {
        progress.set_style(style);
    }
    progress.set_message(message);
    progress.enable_steady_tick(Duration::from_millis(100));

    let result = fut.await;
    progress.finish_and_clear();
    result
}
