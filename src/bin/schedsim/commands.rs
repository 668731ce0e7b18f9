use schedsim::config::{AppConfigExt as _, SimConfig};
use schedsim::output;
use schedsim::run_experiment;
use schedsim::utils::logging::prelude::*;
use schedsim::utils::{self, ErrorKind, Kind as _, Result};

use crate::cli::RunOpts;

/// Run the experiment and write result files
pub fn run(opts: &RunOpts) -> Result<()> {
    let mut cfg: SimConfig = utils::config().sim()?;
    if let Some(seed) = opts.seed {
        cfg.run.seed = seed;
    }
    if !opts.policies.is_empty() {
        cfg.run.policies = opts.policies.clone();
    }

    let run = run_experiment(&cfg, cfg.run.seed)?;
    output::write_results(&cfg, &run)?;
    output::write_job_trace(&cfg, &run)?;

    for policy_run in &run.runs {
        info!(
            policy = %policy_run.kind,
            mean_sojourn = policy_run.mean_sojourn(),
            "finished"
        );
    }
    Ok(())
}

/// Show the merged configuration
pub fn config() -> Result<()> {
    let cfg: SimConfig = utils::config().sim()?;
    let doc = serde_yaml::to_string(&cfg).kind(ErrorKind::ConfigDump)?;
    println!("{}", doc);

    Ok(())
}
