//! topoconf cli interface

use clap::{Parser, Subcommand, ValueEnum};
use std::fmt::Formatter;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Change the work directory
    ///
    /// Can be specified multiple times. Note that all
    /// paths on the way to the final path must exist.
    ///
    /// This is equivalent to running { cd <directory>; topoconf ... }
    #[clap(short = 'C', long = "directory", global(true))]
    pub directory: Vec<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve a blueprint configuration against the cluster hosts
    ///
    /// Host group tokens and `localhost` are replaced by the hosts of the
    /// matching host groups.
    Create(ProcessCommand),

    /// Turn a cluster configuration back into a portable blueprint
    ///
    /// Hosts are replaced by host group tokens, passwords and host specific
    /// properties are removed.
    Export(ProcessCommand),

    /// List the host groups a configuration refers to
    #[command(alias = "groups")]
    RequiredGroups(ProcessCommand),
}

#[derive(Parser, Debug)]
pub struct ProcessCommand {
    #[clap(flatten)]
    pub input: InputArgs,

    #[clap(flatten)]
    pub output: OutputArgs,
}

#[derive(Parser, Debug)]
pub struct InputArgs {
    /// Load a cluster document
    ///
    /// Reads from stdin if not given. The format follows the file extension.
    #[clap(short = 'f', long = "input-file")]
    pub file: Option<PathBuf>,

    /// Format of the document read from stdin
    #[arg(short = 'I', long = "input-format", default_value_t, conflicts_with("file"))]
    pub format: InputFormat,
}

#[derive(ValueEnum, Clone, Copy, Default, Debug)]
pub enum InputFormat {
    Hcl,
    Json,
    #[default]
    Yaml,
}

impl std::fmt::Display for InputFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            InputFormat::Hcl => f.write_str("hcl"),
            InputFormat::Json => f.write_str("json"),
            InputFormat::Yaml => f.write_str("yaml"),
        }
    }
}

impl From<InputFormat> for topoconf::document::DocumentFormat {
    fn from(format: InputFormat) -> Self {
        match format {
            InputFormat::Hcl => Self::Hcl,
            InputFormat::Json => Self::Json,
            InputFormat::Yaml => Self::Yaml,
        }
    }
}

#[derive(Parser, Debug)]
pub struct OutputArgs {
    #[arg(short = 'F', long = "output-format", default_value_t)]
    pub format: OutputFormat,
}

#[derive(ValueEnum, Clone, Default, Debug)]
pub enum OutputFormat {
    Json,
    #[default]
    Yaml,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => f.write_str("json"),
            OutputFormat::Yaml => f.write_str("yaml"),
        }
    }
}
