//! keytree cli interface

use clap::{Parser, Subcommand, ValueEnum};
use std::fmt::Formatter;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Project flat properties into a nested tree
    ///
    /// Reads an ordered key/value mapping from stdin unless a file is given (via --input-file)
    Tree(ProjectCommand),

    /// Print the element events of the projection
    Events(ProjectCommand),

    /// Print debug information for development
    Dev(DevCommand),
}

#[derive(Parser, Debug)]
pub struct ProjectCommand {
    #[clap(flatten)]
    pub input: InputArgs,

    #[clap(flatten)]
    pub output: OutputArgs,

    /// Pass the value of a parent key to its element instead of emitting it separately
    #[clap(short = 'p', long = "parent-values")]
    pub parent_values: bool,
}

#[derive(Parser, Debug)]
pub struct InputArgs {
    /// Load properties from a file
    #[clap(short = 'f', long = "input-file")]
    pub file: Option<PathBuf>,

    #[arg(short = 'I', long = "input-format", default_value_t)]
    pub format: Format,
}

#[derive(Parser, Debug)]
pub struct OutputArgs {
    #[arg(short = 'F', long = "output-format", default_value_t)]
    pub format: Format,
}

#[derive(ValueEnum, Clone, Copy, Default, Debug)]
pub enum Format {
    Json,
    #[default]
    Yaml,
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Format::Json => f.write_str("json"),
            Format::Yaml => f.write_str("yaml"),
        }
    }
}

#[derive(Parser, Debug)]
pub struct DevCommand {
    #[command(subcommand)]
    pub command: DevSubCommand,
}

#[derive(Subcommand, Debug)]
pub enum DevSubCommand {
    /// Show the segments of a key
    Segments { key: String },
    /// Show common and difference key of two keys
    Diff { left: String, right: String },
}
