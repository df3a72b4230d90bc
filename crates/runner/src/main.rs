//! `deblib-runner` -- runs a JKTEBOP task from the command line.
//!
//! # Environment variables
//!
//! | Variable          | Required | Default      | Description                         |
//! |-------------------|----------|--------------|-------------------------------------|
//! | `JKTEBOP_DIR`     | no       | `~/jktebop/` | Engine directory and working dir    |
//! | `JKTEBOP_PROGRAM` | no       | `./jktebop`  | Engine executable                   |
//! | `RUST_LOG`        | no       | `deblib_runner=info,deblib_jktebop=info` | Log filter |

use deblib_jktebop::{default_registry, JktebopConfig, TracingSink};
use deblib_runner::cli::{self, Command};
use deblib_runner::{output, run_task, RunnerError};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "deblib_runner=info,deblib_jktebop=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run(std::env::args().skip(1)).await {
        tracing::error!(error = %e, "deblib-runner failed");
        std::process::exit(1);
    }
}

async fn run(args: impl Iterator<Item = String>) -> Result<(), RunnerError> {
    let registry = default_registry()?;

    let args = match cli::parse_command(args)? {
        Command::Help => {
            println!("{}", cli::USAGE);
            return Ok(());
        }
        Command::List => {
            for name in registry.names() {
                println!("{name}");
            }
            return Ok(());
        }
        Command::Run(args) => args,
    };

    let config = JktebopConfig::from_env();
    tracing::info!(
        dir = %config.dir.display(),
        program = %config.program,
        "Loaded JKTEBOP configuration",
    );

    let mut sink = TracingSink;
    let model = run_task(&registry, &config, &args.task, &args.params, Some(&mut sink)).await?;

    if args.json {
        println!("{}", output::json(&model)?);
    } else {
        print!("{}", output::table(&model));
    }
    Ok(())
}
