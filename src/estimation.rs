use rand_distr::{Distribution, LogNormal, Normal};
use rand_seeder::SipRng;
use serde::{Deserialize, Serialize};

use crate::utils::prelude::*;

/// Maps a true job size to the size announced to the scheduler.
///
/// Estimators own their random source, so runs stay deterministic given a
/// seed no matter how many of them exist side by side.
pub trait SizeEstimator {
    fn estimate(&mut self, size: f64) -> f64;
}

/// Perfect information: announce the true size.
#[derive(Debug, Default)]
pub struct Exact;

impl SizeEstimator for Exact {
    fn estimate(&mut self, size: f64) -> f64 {
        size
    }
}

/// Multiplicative log-normal noise: `size * LogNormal(0, sigma)`.
#[derive(Debug)]
pub struct LogNormalNoise {
    dist: LogNormal<f64>,
    rng: SipRng,
}

impl LogNormalNoise {
    pub fn new(sigma: f64, rng: SipRng) -> Result<Self> {
        Ok(LogNormalNoise {
            dist: LogNormal::new(0.0, sigma)?,
            rng,
        })
    }
}

impl SizeEstimator for LogNormalNoise {
    fn estimate(&mut self, size: f64) -> f64 {
        size * self.dist.sample(&mut self.rng)
    }
}

/// Gaussian relative noise: `factor * size * Normal(1, sigma)`.
#[derive(Debug)]
pub struct NormalNoise {
    factor: f64,
    dist: Normal<f64>,
    rng: SipRng,
}

impl NormalNoise {
    pub fn new(sigma: f64, factor: f64, rng: SipRng) -> Result<Self> {
        Ok(NormalNoise {
            factor,
            dist: Normal::new(1.0, sigma)?,
            rng,
        })
    }
}

impl SizeEstimator for NormalNoise {
    fn estimate(&mut self, size: f64) -> f64 {
        self.factor * size * self.dist.sample(&mut self.rng)
    }
}

// ====== Config ======

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type")]
pub enum EstimationConfig {
    Exact,
    LogNormal {
        sigma: f64,
    },
    Normal {
        sigma: f64,
        #[serde(default = "default_factor")]
        factor: f64,
    },
}

fn default_factor() -> f64 {
    1.0
}

impl EstimationConfig {
    /// The sigma that names result files; 0 for exact estimation.
    pub fn sigma(&self) -> f64 {
        match self {
            EstimationConfig::Exact => 0.0,
            EstimationConfig::LogNormal { sigma } => *sigma,
            EstimationConfig::Normal { sigma, .. } => *sigma,
        }
    }

    pub fn build(&self, rng: SipRng) -> Result<Box<dyn SizeEstimator>> {
        Ok(match self {
            EstimationConfig::Exact => Box::new(Exact),
            EstimationConfig::LogNormal { sigma } => Box::new(LogNormalNoise::new(*sigma, rng)?),
            EstimationConfig::Normal { sigma, factor } => {
                Box::new(NormalNoise::new(*sigma, *factor, rng)?)
            }
        })
    }
}
