use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "stowbox",
    about = "Append resource boxes to executables and inspect them.",
    version
)]
pub struct Cli {
    /// Log debug output (overridden by RUST_LOG)
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(visible_alias = "a", about = "Append box directories to an executable")]
    Append(AppendArgs),

    #[command(visible_aliases = ["l", "ls"], about = "List the boxes appended to an executable")]
    List(ListArgs),
}

#[derive(Debug, clap::Args)]
#[command(after_help = "\
\x1b[1m\x1b[4mBox Names:\x1b[0m
  A box is given either as \x1b[1mNAME=DIR\x1b[0m, or as \x1b[1mDIR\x1b[0m alone, in which
  case the directory path as written is the box name. Use the name the program
  passes to find_box, e.g. \x1b[1mpics/myapp=assets/pics\x1b[0m.

\x1b[1m\x1b[4mExamples:\x1b[0m
  stowbox append --exec target/release/myapp templates
  stowbox append --exec myapp pics/myapp=assets/pics static")]
pub struct AppendArgs {
    /// Executable to append the boxes to
    #[arg(short = 'e', long = "exec", value_name = "BINARY")]
    pub exec: PathBuf,

    /// Suppress output
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Boxes to append
    #[arg(value_name = "BOX", required = true)]
    pub boxes: Vec<String>,
}

#[derive(Debug, clap::Args)]
pub struct ListArgs {
    /// Executable to inspect
    pub binary: PathBuf,

    /// Show every entry of every box
    #[arg(short = 'l', long)]
    pub long: bool,

    /// Output in JSON format
    #[arg(short = 'j', long)]
    pub json: bool,
}
