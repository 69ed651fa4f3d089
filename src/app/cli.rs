use crate::app::config::parse_variable;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Display and download the contents of configured process folders"
)]
pub struct Cli {
    /// Plugin configuration file (defaults to ~/.config/display_content/plugin.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Project the process belongs to, used to pick the configuration block
    #[arg(long, default_value = "*")]
    pub project: String,

    /// Name of the workflow step, used to pick the configuration block
    #[arg(long, default_value = "*")]
    pub step: String,

    /// Process title, available as {processtitle}
    #[arg(long, default_value = "")]
    pub process_title: String,

    /// Process id, available as {processid}
    #[arg(long)]
    pub process_id: Option<u64>,

    /// Step id, available as {stepid}
    #[arg(long)]
    pub step_id: Option<u64>,

    /// Extra path variables (e.g. 'imagepath=/data/images')
    #[arg(long = "var", value_parser = parse_variable)]
    pub vars: Vec<(String, String)>,

    /// Path the caller returns to on cancel or finish
    #[arg(long, default_value = "")]
    pub return_path: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List configured folders with their files and sizes
    List,

    /// Print the human readable size of a file
    Size { file: PathBuf },

    /// Download a discovered file into a directory, or to stdout
    Download {
        file: PathBuf,

        /// Directory to save the file in; stdout when omitted
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },
}
