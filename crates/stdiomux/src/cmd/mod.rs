use clap::{Args, Subcommand};

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod call;
pub mod serve;
pub mod version;

/// Service name the built-in server answers to.
pub const ECHO_SERVICE: &str = "echo";

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve line echo streams over this process's stdin/stdout.
    Serve(ServeArgs),
    /// Spawn a tool, dial it over its stdio and exchange lines.
    Call(CallArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Serve(args) => serve::run(args),
        Command::Call(args) => call::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Compress stream data when the peer supports it.
    #[arg(long)]
    pub compression: bool,
}

#[derive(Args, Debug)]
pub struct CallArgs {
    /// Line to send; repeat for several requests. Default: read lines from stdin.
    #[arg(long = "message", short = 'm', value_name = "LINE")]
    pub messages: Vec<String>,
    /// Service name sent with the dial.
    #[arg(long, default_value = ECHO_SERVICE)]
    pub service: String,
    /// Compress stream data when the peer supports it.
    #[arg(long)]
    pub compression: bool,
    /// Program to spawn, followed by its arguments.
    #[arg(last = true, required = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
