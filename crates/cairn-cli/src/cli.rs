use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "cairn",
    about = "Cairn: content-addressed object graphs in portable containers",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Codec configuration file (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// List the elements of a container without unpacking it
    Inspect(InspectArgs),
    /// Unpack a container into a repository and describe the result
    Unpack(UnpackArgs),
    /// Write a sample container
    Demo(DemoArgs),
    /// Print the effective codec configuration
    Config,
}

#[derive(Args)]
pub struct InspectArgs {
    pub file: PathBuf,
}

#[derive(Args)]
pub struct UnpackArgs {
    pub file: PathBuf,
}

#[derive(Args)]
pub struct DemoArgs {
    /// Output path
    pub file: PathBuf,
    /// Wrap the sample graph in a message envelope
    #[arg(long)]
    pub message: bool,
}
