use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashSet};
use std::iter;
use std::mem;

use super::{equal_shares, Scheduler};
use crate::types::{Allocation, Duration, JobId, Time};
use crate::utils::float;

/// A job in the remaining-work heap. Non-head entries hold stale remaining
/// values; ordering stays correct because only the head is ever debited.
#[derive(Debug, Clone, Copy)]
struct HeapEntry {
    remaining: f64,
    job: JobId,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        float::total_eq(&self.remaining, &other.remaining) && self.job == other.job
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.remaining
            .total_cmp(&other.remaining)
            .then(self.job.cmp(&other.job))
    }
}

/// Pull `job` out of a non-head position: swap with the last element and
/// rebuild. O(n), which is fine since completions almost always hit the head.
fn remove_non_head(heap: &mut BinaryHeap<Reverse<HeapEntry>>, job: JobId) {
    let mut entries = mem::take(heap).into_vec();
    let idx = entries
        .iter()
        .position(|Reverse(e)| e.job == job)
        .unwrap_or_else(|| panic!("dequeuing missing job {}", job));
    entries.swap_remove(idx);
    *heap = BinaryHeap::from(entries);
}

/// Shortest remaining processing time: the job with the least *announced*
/// remaining work holds the whole server.
#[derive(Debug, Default)]
pub struct Srpt {
    jobs: BinaryHeap<Reverse<HeapEntry>>,
    last_t: Time,
}

impl Srpt {
    pub fn new() -> Self {
        Default::default()
    }

    fn update(&mut self, t: Time) {
        let delta = (t - self.last_t).0;
        if delta == 0.0 {
            return;
        }
        if let Some(mut head) = self.jobs.peek_mut() {
            head.0.remaining -= delta;
        }
        self.last_t = t;
    }
}

impl Scheduler for Srpt {
    fn enqueue(&mut self, t: Time, job: JobId, size: f64) {
        self.update(t);
        self.jobs.push(Reverse(HeapEntry { remaining: size, job }));
    }

    fn dequeue(&mut self, t: Time, job: JobId) {
        self.update(t);
        // common case: we dequeue the running job
        if self.jobs.peek().map(|Reverse(e)| e.job == job).unwrap_or(false) {
            self.jobs.pop();
            return;
        }
        remove_non_head(&mut self.jobs, job);
    }

    fn schedule(&mut self, t: Time) -> Allocation {
        self.update(t);
        match self.jobs.peek() {
            Some(Reverse(head)) => iter::once((head.job, 1.0)).collect(),
            None => Allocation::new(),
        }
    }
}

/// SRPT with a safety valve for size misestimation: once the head's
/// announced remaining work is exhausted the job turns `late` and keeps
/// running, but shares the server equally with the SRPT head, so an
/// underestimated job can no longer monopolize the server.
#[derive(Debug)]
pub struct SrptPs {
    jobs: BinaryHeap<Reverse<HeapEntry>>,
    late: HashSet<JobId>,
    last_t: Time,
    eps: f64,
}

impl SrptPs {
    pub fn new(eps: f64) -> Self {
        SrptPs {
            jobs: BinaryHeap::new(),
            late: HashSet::new(),
            last_t: Time::default(),
            eps,
        }
    }

    fn update(&mut self, t: Time) {
        // the head only received an equal share of the capacity
        let delta = (t - self.last_t).0 / (1.0 + self.late.len() as f64);
        if let Some(mut head) = self.jobs.peek_mut() {
            head.0.remaining -= delta;
        }
        while self.jobs.peek().map(|Reverse(e)| e.remaining < self.eps).unwrap_or(false) {
            if let Some(Reverse(e)) = self.jobs.pop() {
                self.late.insert(e.job);
            }
        }
        self.last_t = t;
    }
}

impl Scheduler for SrptPs {
    fn enqueue(&mut self, t: Time, job: JobId, size: f64) {
        self.update(t);
        self.jobs.push(Reverse(HeapEntry { remaining: size, job }));
    }

    fn dequeue(&mut self, t: Time, job: JobId) {
        self.update(t);
        if self.late.remove(&job) {
            return;
        }
        if self.jobs.peek().map(|Reverse(e)| e.job == job).unwrap_or(false) {
            self.jobs.pop();
            return;
        }
        remove_non_head(&mut self.jobs, job);
    }

    fn schedule(&mut self, t: Time) -> Allocation {
        self.update(t);
        let head = self.jobs.peek().map(|Reverse(e)| e.job);
        let scheduled: Vec<JobId> = self.late.iter().copied().chain(head).collect();
        if scheduled.is_empty() {
            Allocation::new()
        } else {
            equal_shares(scheduled)
        }
    }

    fn next_internal_event(&self) -> Option<Duration> {
        let Reverse(head) = self.jobs.peek()?;
        Some(Duration(head.remaining * (1.0 + self.late.len() as f64)))
    }
}
