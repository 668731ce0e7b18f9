use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;

use crate::config::{AppConfigExt as _, SimConfig};
use crate::utils::prelude::*;
use crate::ExperimentRun;

/// File stem in the layout the plotting tools glob for:
/// `res_<shape>_<sigma>_<load>_<timeshape>_<njobs>_<seed>`
fn result_stem(cfg: &SimConfig, seed: u64) -> String {
    format!(
        "res_{}_{}_{}_{}_{}_{}",
        cfg.workload.shape,
        cfg.estimation.sigma(),
        cfg.workload.load,
        cfg.workload.timeshape,
        cfg.workload.njobs,
        seed
    )
}

/// Persist `{policy name -> [sojourn list]}` for one experiment run.
pub fn write_results(cfg: &SimConfig, run: &ExperimentRun) -> Result<()> {
    let path = config()
        .output_dir()?
        .file(format!("{}.json", result_stem(cfg, run.seed)))?;
    info!("writing sojourn times to {}", path.display());

    let doc: BTreeMap<String, Vec<&[f64]>> = run
        .runs
        .iter()
        .map(|r| (r.kind.to_string(), vec![r.sojourns.as_slice()]))
        .collect();

    let file = BufWriter::new(File::create(&path).kind(ErrorKind::ResultsJson)?);
    serde_json::to_writer(file, &doc).kind(ErrorKind::ResultsJson)?;
    Ok(())
}

/// Per-job trace across all policies of one run, as CSV.
pub fn write_job_trace(cfg: &SimConfig, run: &ExperimentRun) -> Result<()> {
    let path = config()
        .output_dir()?
        .file(format!("{}_jobs.csv", result_stem(cfg, run.seed)))?;
    info!("writing job trace to {}", path.display());

    #[derive(serde::Serialize)]
    struct Row<'a> {
        policy: &'a str,
        job_id: usize,
        arrival: f64,
        size: f64,
        completed: f64,
        sojourn: f64,
    }

    let mut writer = csv::Writer::from_path(path).kind(ErrorKind::JobsCsv)?;
    for policy_run in &run.runs {
        let policy = policy_run.kind.to_string();
        for c in &policy_run.completions {
            // workload job ids are dense indexes
            let job = &run.jobs[c.job.0];
            writer
                .serialize(Row {
                    policy: &policy,
                    job_id: c.job.0,
                    arrival: job.arrival.0,
                    size: job.size,
                    completed: c.time.0,
                    sojourn: c.sojourn(job.arrival),
                })
                .kind(ErrorKind::JobsCsv)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunConfig;
    use crate::estimation::EstimationConfig;
    use crate::workload::WorkloadConfig;

    #[test]
    fn result_stem_matches_plot_glob() {
        let cfg = SimConfig {
            workload: WorkloadConfig {
                shape: 0.5,
                load: 0.9,
                njobs: 10000,
                timeshape: 1.0,
            },
            estimation: EstimationConfig::LogNormal { sigma: 0.5 },
            run: RunConfig {
                policies: vec![],
                seed: 7,
            },
        };
        assert_eq!(result_stem(&cfg, 7), "res_0.5_0.5_0.9_1_10000_7");
    }
}
