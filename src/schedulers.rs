use parse_display::{Display, FromStr};
use serde::{Deserialize, Serialize};

use crate::types::{Allocation, Duration, JobId, Time};

mod fifo;
mod fsp;
mod fsp_las;
mod las;
mod ps;
mod srpt;

pub use fifo::Fifo;
pub use fsp::{Fsp, FspPs};
pub use fsp_las::FspLas;
pub use las::Las;
pub use ps::Ps;
pub use srpt::{Srpt, SrptPs};

/// Floating tolerance shared by the policies: work below this is considered done.
pub const EPS: f64 = 1e-6;

/// A preemptive single-server scheduling policy.
///
/// The driver admits jobs with `enqueue`, retires them with `dequeue`, and
/// asks for the current split of the unit resource with `schedule`. All
/// internal bookkeeping (virtual clocks, attained service) is private to the
/// policy and advances when `schedule` observes a new time.
pub trait Scheduler {
    /// Admit a job at time `t`. `size` is the scheduler-visible size and may
    /// be a noisy estimate of the true work.
    fn enqueue(&mut self, t: Time, job: JobId, size: f64);

    /// Remove a job the driver has determined to be complete.
    ///
    /// Panics if the job is not present in the policy's view; that is always
    /// a driver or policy bug.
    fn dequeue(&mut self, t: Time, job: JobId);

    /// Current allocation at time `t`. Shares are positive and sum to 1
    /// whenever any job is present.
    fn schedule(&mut self, t: Time) -> Allocation;

    /// Time until the allocation would change even without external events,
    /// if the policy can predict one. The driver does not consult this; it
    /// exists for diagnostics and for policies composed on top of others.
    fn next_internal_event(&self) -> Option<Duration> {
        None
    }
}

impl Scheduler for Box<dyn Scheduler> {
    #[inline]
    fn enqueue(&mut self, t: Time, job: JobId, size: f64) {
        (**self).enqueue(t, job, size)
    }

    #[inline]
    fn dequeue(&mut self, t: Time, job: JobId) {
        (**self).dequeue(t, job)
    }

    #[inline]
    fn schedule(&mut self, t: Time) -> Allocation {
        (**self).schedule(t)
    }

    #[inline]
    fn next_internal_event(&self) -> Option<Duration> {
        (**self).next_internal_event()
    }
}

/// The policy family, by name. Parses from and displays as the names used
/// in result files (`SRPT+PS`, `FSP+LAS`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, FromStr, Serialize, Deserialize)]
pub enum PolicyKind {
    #[display("PS")]
    #[serde(rename = "PS")]
    Ps,
    #[display("FIFO")]
    #[serde(rename = "FIFO")]
    Fifo,
    #[display("SRPT")]
    #[serde(rename = "SRPT")]
    Srpt,
    #[display("SRPT+PS")]
    #[serde(rename = "SRPT+PS")]
    SrptPs,
    #[display("FSP")]
    #[serde(rename = "FSP")]
    Fsp,
    #[display("FSP+PS")]
    #[serde(rename = "FSP+PS")]
    FspPs,
    #[display("LAS")]
    #[serde(rename = "LAS")]
    Las,
    #[display("FSP+LAS")]
    #[serde(rename = "FSP+LAS")]
    FspLas,
}

impl PolicyKind {
    /// All policies, in the order result files list them.
    pub fn all() -> &'static [PolicyKind] {
        &[
            PolicyKind::Fifo,
            PolicyKind::Ps,
            PolicyKind::Srpt,
            PolicyKind::SrptPs,
            PolicyKind::Fsp,
            PolicyKind::FspPs,
            PolicyKind::Las,
            PolicyKind::FspLas,
        ]
    }

    pub fn build(&self) -> Box<dyn Scheduler> {
        match self {
            PolicyKind::Ps => Box::new(Ps::new()),
            PolicyKind::Fifo => Box::new(Fifo::new()),
            PolicyKind::Srpt => Box::new(Srpt::new()),
            PolicyKind::SrptPs => Box::new(SrptPs::new(EPS)),
            PolicyKind::Fsp => Box::new(Fsp::new(EPS)),
            PolicyKind::FspPs => Box::new(FspPs::new(EPS)),
            PolicyKind::Las => Box::new(Las::new(EPS)),
            PolicyKind::FspLas => Box::new(FspLas::new(EPS)),
        }
    }
}

/// Equal split of the unit resource over a non-empty group of jobs.
pub(crate) fn equal_shares<I>(jobs: I) -> Allocation
where
    I: IntoIterator<Item = JobId>,
    I::IntoIter: ExactSizeIterator,
{
    let jobs = jobs.into_iter();
    let share = 1.0 / jobs.len() as f64;
    jobs.map(|job| (job, share)).collect()
}
