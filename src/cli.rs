use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sttlayout")]
#[command(author, version, about = "Edit and preview EM/MT receiver channel layouts as .stt templates")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Log file for the editor (defaults to sttlayout.log next to the executable)
    #[arg(long, global = true, env = "STTLAYOUT_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Directory templates are saved into
    #[arg(long, global = true, env = "STTLAYOUT_OUTPUT_DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// Editor refresh tick in milliseconds
    #[arg(long, global = true, default_value_t = 250)]
    pub tick_ms: u64,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Open the interactive editor (default)
    Edit {
        /// Template file to load on start
        file: Option<PathBuf>,
    },

    /// Parse a template and print its channels, extents and skipped blocks
    Check {
        /// Template file
        file: PathBuf,
    },

    /// Parse a template and write it back in canonical form
    Fmt {
        /// Template file
        file: PathBuf,

        /// Write to this file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}
