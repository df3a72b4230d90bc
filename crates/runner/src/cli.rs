//! Command-line argument parsing.
//!
//! ```text
//! deblib-runner [--json] <task> [name=value ...]
//! deblib-runner --list
//! ```

use deblib_core::error::ParamsError;
use deblib_core::params::{parse_assignment, Params};

pub const USAGE: &str = "\
Usage: deblib-runner [--json] <task> [name=value ...]
       deblib-runner --list

Renders the task's input file from the given parameters, runs JKTEBOP and
prints the resulting model light curve.

Options:
  --json    print the model as JSON
  --list    list the available tasks
  --help    show this message";

/// Error type for argument parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CliError {
    #[error("No task given\n\n{usage}", usage = USAGE)]
    MissingTask,

    #[error("Unknown option '{0}'\n\n{usage}", usage = USAGE)]
    UnknownOption(String),

    #[error("Invalid parameter: {0}")]
    Param(#[from] ParamsError),
}

/// What the command line asks for.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Run(RunArgs),
    List,
    Help,
}

/// Arguments of a task run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunArgs {
    pub task: String,
    pub params: Params,
    pub json: bool,
}

/// Parse the arguments after the program name.
pub fn parse_command<I, S>(args: I) -> Result<Command, CliError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut task = None;
    let mut params = Params::new();
    let mut json = false;

    for arg in args {
        let arg = arg.as_ref();
        match arg {
            "--help" | "-h" => return Ok(Command::Help),
            "--list" => return Ok(Command::List),
            "--json" => json = true,
            _ if arg.starts_with("--") => return Err(CliError::UnknownOption(arg.to_string())),
            _ if task.is_none() => task = Some(arg.to_string()),
            _ => {
                let (name, value) = parse_assignment(arg)?;
                params.insert(name, value);
            }
        }
    }

    let task = task.ok_or(CliError::MissingTask)?;
    Ok(Command::Run(RunArgs { task, params, json }))
}

/// Parse a task run, rejecting `--list` and `--help`.
pub fn parse_args<I, S>(args: I) -> Result<RunArgs, CliError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    match parse_command(args)? {
        Command::Run(run) => Ok(run),
        Command::List | Command::Help => Err(CliError::MissingTask),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
