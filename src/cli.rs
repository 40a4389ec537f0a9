use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Process a raw form record through the full pipeline
    Process {
        /// Input JSON file containing the raw form record
        #[arg(short, long)]
        input: PathBuf,

        /// Write the processing result here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Submit the mapped payload to the forms backend
        #[arg(long)]
        submit: bool,

        /// Skip Sinhala translation
        #[arg(long)]
        no_translate: bool,

        /// Print the generated AI prompt after processing
        #[arg(long)]
        show_prompt: bool,
    },

    /// Check a raw form record against the required-field list
    Validate {
        /// Input JSON file containing the raw form record
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Print the AI prompt generated from a raw form record
    Prompt {
        /// Input JSON file containing the raw form record
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Process a record and write the downloadable JSON export
    Export {
        /// Input JSON file containing the raw form record
        #[arg(short, long)]
        input: PathBuf,

        /// Directory for the export file (defaults to the input's directory)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Override the generated export filename
        #[arg(long)]
        filename: Option<String>,
    },

    /// Process every .json record in a directory
    Batch {
        /// Directory containing raw form records
        #[arg(short, long)]
        input_dir: PathBuf,

        /// Output directory for processing results
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Submit each mapped payload to the forms backend
        #[arg(long)]
        submit: bool,
    },

    /// Forms backend administration
    Backend {
        #[command(subcommand)]
        action: BackendAction,
    },

    /// Generate a marketing strategy for a processed record
    Strategy {
        /// Input JSON file containing the raw form record
        #[arg(short, long)]
        input: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum BackendAction {
    /// Check backend connectivity
    Health,

    /// List stored submissions
    List {
        /// Page number
        #[arg(long, default_value = "1")]
        page: u32,

        /// Page size
        #[arg(long, default_value = "50")]
        limit: u32,
    },

    /// Fetch a single submission
    Get {
        /// Submission id
        id: String,
    },

    /// Show submission statistics
    Stats,

    /// Update a submission's status
    SetStatus {
        /// Submission id
        id: String,

        /// New status value
        status: String,
    },

    /// Delete a submission
    Delete {
        /// Submission id
        id: String,
    },
}
