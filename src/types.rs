use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::ops::{Add, AddAssign, Sub};

use derive_more::{Deref, DerefMut, Display, From};
use serde::{Deserialize, Serialize};

/// A time point in simulation
#[derive(Debug, Default, Clone, Copy, From, Display, Deref, DerefMut, Serialize, Deserialize)]
pub struct Time(pub f64);

impl PartialEq for Time {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0).is_eq()
    }
}

impl Eq for Time {}

impl PartialOrd for Time {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.0.total_cmp(&other.0))
    }
}

impl Ord for Time {
    fn cmp(&self, other: &Self) -> Ordering {
        self.partial_cmp(other).unwrap()
    }
}

/// A duration of time in simulation
#[derive(Debug, Default, Clone, Copy, From, Display, Deref, DerefMut, Serialize, Deserialize)]
pub struct Duration(pub f64);

impl PartialEq for Duration {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0).is_eq()
    }
}

impl Eq for Duration {}

impl PartialOrd for Duration {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.0.total_cmp(&other.0))
    }
}

impl Ord for Duration {
    fn cmp(&self, other: &Self) -> Ordering {
        self.partial_cmp(other).unwrap()
    }
}

impl Add<Duration> for Time {
    type Output = Time;

    fn add(self, rhs: Duration) -> Self::Output {
        Time(self.0 + rhs.0)
    }
}

impl AddAssign<Duration> for Time {
    fn add_assign(&mut self, rhs: Duration) {
        self.0 += rhs.0;
    }
}

impl Sub for Time {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Self::Output {
        Duration(self.0 - rhs.0)
    }
}

/// Identifier of a job, unique within one simulation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, From, Display, Serialize, Deserialize)]
pub struct JobId(pub usize);

/// A job as produced by the workload generator. `size` is the true amount of
/// work; schedulers only ever see an estimate of it.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkloadJob {
    pub id: JobId,
    pub arrival: Time,
    pub size: f64,
}

impl fmt::Display for WorkloadJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WorkloadJob({}, @{:.2}, {:.2})", self.id, self.arrival.0, self.size)
    }
}

/// Emitted by the simulation driver when a job finishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub time: Time,
    pub job: JobId,
}

impl fmt::Display for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Completion({}, @{:.2})", self.job, self.time.0)
    }
}

impl Completion {
    /// Sojourn time with respect to the given arrival
    pub fn sojourn(&self, arrival: Time) -> f64 {
        (self.time - arrival).0
    }
}

/// Fractional assignment of the unit resource, as returned by
/// [`Scheduler::schedule`](crate::schedulers::Scheduler::schedule).
/// Shares are in `(0, 1]` and sum to at most 1.
pub type Allocation = HashMap<JobId, f64>;
