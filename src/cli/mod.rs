use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "yt-insights",
    about = "YT Insights - Turn YouTube transcripts into detailed insight summaries using Google Gemini",
    version,
    long_about = "Fetches the caption track of a YouTube video (or takes a transcript you paste in) and asks Google Gemini for a long summary covering key points, insights, recommendations, positives and negatives."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Summarize a YouTube video or a transcript
    Summarize {
        /// YouTube URL (youtu.be or youtube.com/watch?v=), or transcript text with --text
        #[arg(value_name = "URL_OR_TEXT", required_unless_present = "file")]
        input: Option<String>,

        /// Treat the input as transcript text instead of a URL
        #[arg(long, conflicts_with = "file")]
        text: bool,

        /// Read the transcript text from a file
        #[arg(long, value_name = "FILE")]
        file: Option<PathBuf>,

        /// Caption language in preference order (repeatable, overrides config)
        #[arg(short, long = "language", value_name = "LANG")]
        languages: Vec<String>,

        /// Output file path (prints to console if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Fetch and print the transcript of a YouTube video
    Transcript {
        /// YouTube URL (youtu.be or youtube.com/watch?v=)
        #[arg(value_name = "URL")]
        url: String,

        /// Caption language in preference order (repeatable, overrides config)
        #[arg(short, long = "language", value_name = "LANG")]
        languages: Vec<String>,

        /// Output file path (prints to console if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Show or initialize the configuration file
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,

        /// Write a default configuration file
        #[arg(long, conflicts_with = "show")]
        init: bool,
    },
}

#[derive(ValueEnum, Clone, Debug)]
pub enum OutputFormat {
    /// Plain text
    Text,
    /// Markdown document with a heading
    Markdown,
    /// JSON with source and timestamp
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Markdown => write!(f, "markdown"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}
