use std::collections::HashMap;

use itertools::Itertools as _;
use rand_seeder::{Seeder, SipRng};

pub mod config;
pub mod estimation;
pub mod output;
pub mod schedulers;
pub mod simulator;
pub mod types;
pub mod utils;
pub mod workload;

use crate::config::SimConfig;
use crate::estimation::EstimationConfig;
use crate::schedulers::PolicyKind;
use crate::simulator::Simulation;
use crate::types::{Completion, JobId, Time, WorkloadJob};
use crate::utils::prelude::*;

/// One policy simulated over one workload.
pub struct PolicyRun {
    pub kind: PolicyKind,
    /// in completion order
    pub completions: Vec<Completion>,
    /// in job id order
    pub sojourns: Vec<f64>,
}

impl PolicyRun {
    pub fn mean_sojourn(&self) -> f64 {
        self.sojourns.iter().sum::<f64>() / self.sojourns.len() as f64
    }
}

/// Every configured policy simulated over the same workload.
pub struct ExperimentRun {
    pub seed: u64,
    pub jobs: Vec<WorkloadJob>,
    pub runs: Vec<PolicyRun>,
}

/// Simulate one policy over a shared workload. The estimator gets its own
/// rng, seeded from the run seed and the policy name, so adding or removing
/// policies does not disturb the others.
pub fn run_policy(
    jobs: &[WorkloadJob],
    kind: PolicyKind,
    estimation: &EstimationConfig,
    seed: u64,
) -> Result<PolicyRun> {
    let rng: SipRng = Seeder::from(("estimation", seed, kind.to_string())).make_rng();
    let estimator = estimation.build(rng)?;

    let sim = Simulation::new(jobs.iter().cloned(), kind.build(), estimator);
    let completions: Vec<Completion> = sim.collect();

    let arrivals: HashMap<JobId, Time> = jobs.iter().map(|j| (j.id, j.arrival)).collect();
    let sojourns = completions
        .iter()
        .sorted_by_key(|c| c.job)
        .map(|c| c.sojourn(arrivals[&c.job]))
        .collect();

    Ok(PolicyRun { kind, completions, sojourns })
}

/// Generate the workload for `seed` and run every configured policy on it.
pub fn run_experiment(cfg: &SimConfig, seed: u64) -> Result<ExperimentRun> {
    let rng: SipRng = Seeder::from(("workload", seed)).make_rng();
    let jobs: Vec<WorkloadJob> = workload::workload(&cfg.workload, rng)?.collect();
    info!(seed, njobs = jobs.len(), "generated workload");

    let runs: Vec<PolicyRun> = cfg
        .run
        .policies
        .iter()
        .map(|&kind| {
            let _span = info_span!("policy", %kind).entered();
            let run = run_policy(&jobs, kind, &cfg.estimation, seed)?;
            info!(mean_sojourn = run.mean_sojourn(), "simulated");
            Ok(run)
        })
        .collect::<Result<_>>()?;

    Ok(ExperimentRun { seed, jobs, runs })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunConfig;
    use crate::workload::WorkloadConfig;

    fn test_config() -> SimConfig {
        SimConfig {
            workload: WorkloadConfig {
                shape: 0.5,
                load: 0.9,
                njobs: 50,
                timeshape: 1.0,
            },
            estimation: EstimationConfig::Exact,
            run: RunConfig {
                policies: PolicyKind::all().to_vec(),
                seed: 3,
            },
        }
    }

    #[test]
    fn every_policy_completes_every_job() {
        let cfg = test_config();
        let exp = run_experiment(&cfg, cfg.run.seed).unwrap();
        assert_eq!(exp.runs.len(), PolicyKind::all().len());
        for run in &exp.runs {
            assert_eq!(run.completions.len(), cfg.workload.njobs, "{}", run.kind);
            assert_eq!(run.sojourns.len(), cfg.workload.njobs, "{}", run.kind);
            // a job cannot finish faster than its size
            for (sojourn, job) in run.sojourns.iter().zip(&exp.jobs) {
                assert!(*sojourn >= job.size - simulator::EPS_DRIVER);
            }
        }
    }

    #[test]
    fn experiments_are_reproducible() {
        let cfg = test_config();
        let a = run_experiment(&cfg, 9).unwrap();
        let b = run_experiment(&cfg, 9).unwrap();
        assert_eq!(a.jobs, b.jobs);
        for (ra, rb) in a.runs.iter().zip(&b.runs) {
            assert_eq!(ra.completions, rb.completions);
        }
    }
}
