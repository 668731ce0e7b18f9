use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::estimation::EstimationConfig;
use crate::schedulers::PolicyKind;
use crate::utils::app_config::AppConfig;
use crate::utils::prelude::*;
use crate::workload::WorkloadConfig;

/// The full simulation configuration, as merged from the embedded defaults,
/// an optional config file, and the environment.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimConfig {
    pub workload: WorkloadConfig,
    pub estimation: EstimationConfig,
    pub run: RunConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RunConfig {
    /// which policies to simulate, all over the same workload
    pub policies: Vec<PolicyKind>,
    /// seed for the workload and the estimators
    pub seed: u64,
}

#[derive(Deserialize)]
pub struct OutputDir(PathBuf);

impl OutputDir {
    pub fn file(&self, name: impl AsRef<Path>) -> Result<PathBuf> {
        fs::create_dir_all(&self.0).kind(ErrorKind::InvalidConfig)?;
        Ok(self.0.join(name))
    }
}

pub trait AppConfigExt {
    fn output_dir(&self) -> Result<OutputDir>;
    fn sim(&self) -> Result<SimConfig>;
}

impl AppConfigExt for AppConfig {
    fn output_dir(&self) -> Result<OutputDir> {
        self.get("output_dir")
    }

    fn sim(&self) -> Result<SimConfig> {
        self.fetch()
    }
}
