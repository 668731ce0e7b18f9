//! Cross-policy properties over generated workloads.

use rand_seeder::{Seeder, SipRng};

use schedsim::estimation::EstimationConfig;
use schedsim::run_policy;
use schedsim::schedulers::PolicyKind;
use schedsim::simulator::EPS_DRIVER;
use schedsim::types::WorkloadJob;
use schedsim::workload::{workload, WorkloadConfig};

fn make_jobs(seed: u64, njobs: usize) -> Vec<WorkloadJob> {
    let cfg = WorkloadConfig {
        shape: 0.5,
        load: 0.9,
        njobs,
        timeshape: 1.0,
    };
    let rng: SipRng = Seeder::from(("workload", seed)).make_rng();
    workload(&cfg, rng).unwrap().collect()
}

fn sojourns(jobs: &[WorkloadJob], kind: PolicyKind, estimation: &EstimationConfig) -> Vec<f64> {
    run_policy(jobs, kind, estimation, 0).unwrap().sojourns
}

#[test]
fn every_policy_conserves_work() {
    for &estimation in &[
        EstimationConfig::Exact,
        EstimationConfig::LogNormal { sigma: 0.5 },
    ] {
        for seed in 1..=3u64 {
            let jobs = make_jobs(seed, 150);
            for &kind in PolicyKind::all() {
                let run = run_policy(&jobs, kind, &estimation, seed).unwrap();
                assert_eq!(run.completions.len(), jobs.len(), "{} lost jobs", kind);
                // completions come out in time order
                for pair in run.completions.windows(2) {
                    assert!(pair[0].time <= pair[1].time, "{} out of order", kind);
                }
                // nothing finishes faster than its true size
                for (sojourn, job) in run.sojourns.iter().zip(&jobs) {
                    assert!(
                        *sojourn >= job.size - EPS_DRIVER,
                        "{}: job {} finished impossibly fast",
                        kind,
                        job.id
                    );
                }
            }
        }
    }
}

#[test]
fn fifo_completes_in_arrival_order() {
    let jobs = make_jobs(4, 200);
    let run = run_policy(&jobs, PolicyKind::Fifo, &EstimationConfig::Exact, 4).unwrap();

    let order: Vec<_> = run.completions.iter().map(|c| c.job).collect();
    let arrivals: Vec<_> = jobs.iter().map(|j| j.id).collect();
    assert_eq!(order, arrivals);

    // finish_i = max(arrival_i, finish_{i-1}) + size_i
    let mut finish = 0.0f64;
    for (job, completion) in jobs.iter().zip(&run.completions) {
        finish = finish.max(job.arrival.0) + job.size;
        assert!((completion.time.0 - finish).abs() <= EPS_DRIVER);
    }
}

#[test]
fn srpt_minimizes_mean_sojourn() {
    for seed in 1..=3u64 {
        let jobs = make_jobs(seed, 200);
        let exact = EstimationConfig::Exact;
        let mean = |kind| -> f64 {
            let s = sojourns(&jobs, kind, &exact);
            s.iter().sum::<f64>() / s.len() as f64
        };
        let srpt = mean(PolicyKind::Srpt);
        assert!(srpt <= mean(PolicyKind::Ps) + EPS_DRIVER);
        assert!(srpt <= mean(PolicyKind::Fifo) + EPS_DRIVER);
    }
}

#[test]
fn fsp_dominates_ps_jobwise() {
    for seed in 1..=3u64 {
        let jobs = make_jobs(seed, 200);
        let exact = EstimationConfig::Exact;
        let fsp = sojourns(&jobs, PolicyKind::Fsp, &exact);
        let ps = sojourns(&jobs, PolicyKind::Ps, &exact);
        for (job, (f, p)) in jobs.iter().zip(fsp.iter().zip(&ps)) {
            assert!(
                *f <= *p + EPS_DRIVER,
                "job {}: FSP sojourn {} exceeds PS sojourn {}",
                job.id,
                f,
                p
            );
        }
    }
}

#[test]
fn ps_serves_continuously_present_jobs_equally() {
    use schedsim::types::{JobId, Time};

    // two equal jobs arriving together share the server for their whole
    // life and finish together having each received half the elapsed time
    let jobs = vec![
        WorkloadJob { id: JobId(0), arrival: Time(0.0), size: 2.0 },
        WorkloadJob { id: JobId(1), arrival: Time(0.0), size: 2.0 },
    ];
    let run = run_policy(&jobs, PolicyKind::Ps, &EstimationConfig::Exact, 0).unwrap();
    for completion in &run.completions {
        assert!((completion.time.0 - 4.0).abs() <= EPS_DRIVER);
    }
}
