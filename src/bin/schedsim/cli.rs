use structopt::StructOpt;

use schedsim::schedulers::PolicyKind;
use schedsim::utils::{self, AppConfig, Result};

use crate::commands;

/// Discrete-event simulator for preemptive single-server scheduling policies
#[derive(Debug, StructOpt)]
#[structopt(name = "schedsim")]
pub struct Opts {
    /// Set a custom config file
    #[structopt(short, long, value_name = "FILE")]
    config: Option<String>,

    #[structopt(subcommand)]
    command: Command,
}

#[derive(Debug, StructOpt)]
pub enum Command {
    /// Run the configured experiment and write result files
    Run(RunOpts),
    /// Show the merged configuration
    Config,
}

#[derive(Debug, StructOpt)]
pub struct RunOpts {
    /// Seed for the workload and the estimators; overrides the configured one
    #[structopt(long)]
    pub seed: Option<u64>,

    /// Policy to simulate (repeatable); overrides the configured list
    #[structopt(long = "policy")]
    pub policies: Vec<PolicyKind>,
}

/// Parse arguments and dispatch
pub fn execute() -> Result<()> {
    let opts = Opts::from_args();

    // Merge the config file if the value is set
    AppConfig::merge_config(opts.config.as_deref())?;

    // logging reads its settings from the merged config; the guard flushes
    // the non-blocking writers on drop
    let _guard = utils::logging::setup()?;

    match opts.command {
        Command::Run(run) => commands::run(&run),
        Command::Config => commands::config(),
    }
}
