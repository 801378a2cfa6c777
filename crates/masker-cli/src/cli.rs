use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "masker")]
#[command(about = "Sensitive entity redaction for text and documents", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (default: platform config dir)
    #[arg(long, global = true, env = "MASKER_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Service {
    /// Redaction API
    Mask,
    /// Document API and web UI
    Docs,
    /// Both, in one process
    All,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start HTTP services
    Serve {
        #[arg(value_enum, default_value = "all")]
        service: Service,
    },

    /// Redact a piece of text and print the JSON result
    Mask {
        /// Text to redact
        text: String,

        /// Labels to detect, comma separated (default: all built-in labels)
        #[arg(long, value_delimiter = ',')]
        labels: Vec<String>,

        /// Extra user-defined labels
        #[arg(long, default_value = "")]
        custom: String,

        #[arg(long)]
        max_chunk_len: Option<usize>,
    },

    /// Redact a .docx or .pdf file
    Process {
        /// Input document
        file: PathBuf,

        /// Labels to detect, comma separated (default: all built-in labels)
        #[arg(long, value_delimiter = ',')]
        labels: Vec<String>,

        /// Extra user-defined labels
        #[arg(long, default_value = "")]
        custom: String,

        #[arg(long)]
        max_chunk_len: Option<usize>,

        /// For PDF input: render the result back to PDF instead of Markdown
        #[arg(long)]
        return_pdf: bool,

        /// Output path (default: desensitized_<name> next to the input)
        #[arg(long, short)]
        out: Option<PathBuf>,

        /// Use the configured redaction service instead of the built-in engine
        #[arg(long)]
        remote: bool,
    },
}
