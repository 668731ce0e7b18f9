use std::collections::VecDeque;
use std::iter;

use super::Scheduler;
use crate::types::{Allocation, JobId, Time};

/// First-in first-out: the oldest present job holds the whole server.
///
/// Interior removal is supported even though under this simulator only the
/// head ever completes naturally.
#[derive(Debug, Default)]
pub struct Fifo {
    jobs: VecDeque<JobId>,
}

impl Fifo {
    pub fn new() -> Self {
        Default::default()
    }
}

impl Scheduler for Fifo {
    fn enqueue(&mut self, _t: Time, job: JobId, _size: f64) {
        self.jobs.push_back(job);
    }

    fn dequeue(&mut self, _t: Time, job: JobId) {
        match self.jobs.iter().position(|&j| j == job) {
            Some(idx) => {
                self.jobs.remove(idx);
            }
            None => panic!("dequeuing missing job {}", job),
        }
    }

    fn schedule(&mut self, _t: Time) -> Allocation {
        match self.jobs.front() {
            Some(&job) => iter::once((job, 1.0)).collect(),
            None => Allocation::new(),
        }
    }
}
