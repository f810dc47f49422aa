use clap::{ArgGroup, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "quizgen",
    about = "AI Quiz Generator - Turn YouTube videos and documents into multiple-choice quizzes",
    version,
    long_about = "Extracts text from YouTube captions or an uploaded document (PDF, DOCX, TXT), asks a chat-completion API to write multiple-choice questions about it, and exports the quiz as JSON and as a PDF report."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// API key for the chat-completion service
    #[arg(long, global = true, env = "DEEPSEEK_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a quiz from a YouTube video or a document
    #[command(group(ArgGroup::new("input").required(true).args(["url", "file"])))]
    Generate {
        /// YouTube video URL (the video must have captions)
        #[arg(short, long, value_name = "URL")]
        url: Option<String>,

        /// Document to generate from (PDF, DOCX, or TXT)
        #[arg(short, long, value_name = "FILE")]
        file: Option<PathBuf>,

        /// Declared MIME type of the document (derived from the extension if omitted)
        #[arg(long, value_name = "MIME", requires = "file", conflicts_with = "url")]
        content_type: Option<String>,

        /// Directory for the exported files (defaults to the configured output directory)
        #[arg(short, long, value_name = "DIR")]
        output_dir: Option<PathBuf>,

        /// Only display the quiz, do not write export files
        #[arg(long)]
        no_export: bool,
    },

    /// Verify the API key, the caption tool, and connectivity
    Check {
        /// Skip checks that need network access
        #[arg(long)]
        offline: bool,
    },

    /// Show or initialize settings
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,

        /// Write the default settings to the user config file
        #[arg(long, conflicts_with = "show")]
        init: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_generate_requires_exactly_one_input() {
        assert!(Cli::try_parse_from(["quizgen", "generate"]).is_err());
        assert!(Cli::try_parse_from([
            "quizgen",
            "generate",
            "--url",
            "https://youtu.be/x",
            "--file",
            "notes.txt"
        ])
        .is_err());
        assert!(Cli::try_parse_from(["quizgen", "generate", "--file", "notes.txt"]).is_ok());
    }

    #[test]
    fn test_content_type_needs_a_file() {
        assert!(Cli::try_parse_from([
            "quizgen",
            "generate",
            "--url",
            "https://youtu.be/x",
            "--content-type",
            "text/plain"
        ])
        .is_err());
        assert!(Cli::try_parse_from([
            "quizgen",
            "generate",
            "--file",
            "notes.bin",
            "--content-type",
            "text/plain"
        ])
        .is_ok());
    }
}
