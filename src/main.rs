use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use microloop::config::Config;
use microloop::runtime::{Runtime, StdoutConsole};
use microloop::scenarios::{self, Scenario};
use microloop::{mlog, mlog_error, Error, Result};

/// microloop - step through Promise chains on a simulated event loop
#[derive(Parser, Debug)]
#[command(name = "microloop")]
#[command(version, about, long_about = None)]
#[command(
    after_help = "ENVIRONMENT:\n    MICROLOOP_DEBUG=1     Enable debug logging (alternative to --debug)"
)]
pub struct Cli {
    /// Enable debug logging (writes to ~/.microloop/microloop.log)
    #[arg(short = 'd', long)]
    pub debug: bool,

    /// Read configuration from this file instead of ~/.microloop/microloop.toml
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// List the available scenarios
    List,

    /// Run one scenario and print what it logs
    Run {
        /// Scenario name (see `list`)
        name: String,

        /// Print the transcript and run report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run every scenario and compare with its expected output
    Check,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    microloop::log::init_with_debug(cli.debug);

    match dispatch(cli) {
        Ok(code) => code,
        Err(err) => {
            mlog_error!("{}", err);
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn dispatch(cli: Cli) -> Result<ExitCode> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Command::List => {
            run_list();
            Ok(ExitCode::SUCCESS)
        }
        Command::Run { name, json } => run_scenario(&config, &name, json),
        Command::Check => run_check(&config),
    }
}

fn run_list() {
    let width = scenarios::catalog()
        .iter()
        .map(|s| s.name.len())
        .max()
        .unwrap_or(0);
    for scenario in scenarios::catalog() {
        println!("{:width$}  {}", scenario.name, scenario.title, width = width);
    }
}

fn run_scenario(config: &Config, name: &str, json: bool) -> Result<ExitCode> {
    let scenario = scenarios::find(name)?;
    if json {
        let outcome = scenario.run(config)?;
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(ExitCode::SUCCESS);
    }

    run_live(config, scenario)
}

/// Print straight to stdout while the loop runs, then the unobserved
/// rejections on stderr the way Node reports them.
fn run_live(config: &Config, scenario: &Scenario) -> Result<ExitCode> {
    mlog!("run {}", scenario.name);
    let mut rt = Runtime::new(config.clone(), Box::new(StdoutConsole));
    scenario.build_into(&mut rt);
    let report = rt.run()?;
    for rejection in &report.unobserved {
        eprintln!("{}", rejection);
    }
    Ok(ExitCode::SUCCESS)
}

fn run_check(config: &Config) -> Result<ExitCode> {
    let mut failures = 0;
    for scenario in scenarios::catalog() {
        match scenario.check(config) {
            Ok(_) => println!("ok    {}", scenario.name),
            Err(Error::ScenarioMismatch {
                name,
                expected,
                actual,
            }) => {
                failures += 1;
                println!("FAIL  {}", name);
                println!("      expected: {:?}", expected);
                println!("      actual:   {:?}", actual);
            }
            Err(err) => return Err(err),
        }
    }

    println!(
        "{} scenarios, {} failed",
        scenarios::catalog().len(),
        failures
    );
    Ok(if failures == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
