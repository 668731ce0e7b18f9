use rand::Rng;
use rand_distr::{Distribution, Weibull};
use serde::{Deserialize, Serialize};
use statrs::function::gamma::gamma;

use crate::types::{Duration, JobId, Time, WorkloadJob};
use crate::utils::prelude::*;

/// Parameters of the synthetic Weibull workload.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct WorkloadConfig {
    /// shape of the Weibull job size distribution
    pub shape: f64,
    /// offered load, as a fraction of the server capacity
    pub load: f64,
    /// number of jobs to generate
    pub njobs: usize,
    /// shape of the Weibull inter-arrival distribution; 1 gives Poisson arrivals
    pub timeshape: f64,
}

fn weibull_mean(shape: f64, scale: f64) -> f64 {
    scale * gamma(1.0 + 1.0 / shape)
}

/// Generate a finite stream of jobs with Weibull sizes (scale 1) and Weibull
/// inter-arrival times scaled so the long-run offered load matches
/// `cfg.load`. Arrival times are nondecreasing; job ids are dense from 0.
pub fn workload<'a>(
    cfg: &WorkloadConfig,
    rng: impl Rng + 'a,
) -> Result<impl Iterator<Item = WorkloadJob> + 'a> {
    if !(cfg.load > 0.0 && cfg.load < 1.0) {
        return Err(Error::invalid_config("workload load must be in (0, 1)"));
    }
    if cfg.shape <= 0.0 || cfg.timeshape <= 0.0 {
        return Err(Error::invalid_config("workload shapes must be positive"));
    }

    let sizes = Weibull::new(1.0, cfg.shape)?;

    // pick the inter-arrival scale so that E[interarrival] = E[size] / load
    let mean_interval = weibull_mean(cfg.shape, 1.0) / cfg.load;
    let interval_scale = mean_interval / gamma(1.0 + 1.0 / cfg.timeshape);
    let intervals = Weibull::new(interval_scale, cfg.timeshape)?;

    let mut rng = rng;
    let iter = (0..cfg.njobs).scan(Time(0.0), move |clock, id| {
        *clock += Duration(intervals.sample(&mut rng));
        Some(WorkloadJob {
            id: JobId(id),
            arrival: *clock,
            size: sizes.sample(&mut rng),
        })
    });
    Ok(iter)
}
