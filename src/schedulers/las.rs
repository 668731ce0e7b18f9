use std::collections::{BTreeMap, HashMap, HashSet};

use super::{equal_shares, Scheduler};
use crate::types::{Allocation, Duration, JobId, Time};

/// Attained service, in units of `eps`. Working on integer buckets keeps
/// repeated fractional credits from drifting apart jobs that served
/// together.
pub(super) type Bucket = u64;

/// The last allocation decision, grouped by the bucket the jobs were
/// scheduled at: `bucket -> [(share, jobs)]`. This is what `update` credits;
/// composite schedulers overwrite it to route their own decisions through
/// the same bookkeeping.
pub(super) type Scheduled = HashMap<Bucket, Vec<(f64, HashSet<JobId>)>>;

/// Least attained service: the jobs that have received the least cumulative
/// service so far share the server equally.
#[derive(Debug)]
pub struct Las {
    eps: f64,
    /// pending jobs grouped by attained service
    queue: BTreeMap<Bucket, HashSet<JobId>>,
    attained: HashMap<JobId, Bucket>,
    scheduled: Scheduled,
    last_t: Time,
}

impl Las {
    pub fn new(eps: f64) -> Self {
        Las {
            eps,
            queue: BTreeMap::new(),
            attained: HashMap::new(),
            scheduled: Scheduled::new(),
            last_t: Time::default(),
        }
    }

    /// Credit the service implied by the last `scheduled` snapshot up to `t`
    /// and regroup the queue. Runs exactly once per observed time advance:
    /// only `schedule` (or a composing scheduler) calls it.
    pub(super) fn update(&mut self, t: Time) {
        let delta = ((t - self.last_t).0 / self.eps).ceil() as u64;

        for (&bucket, sub_schedule) in self.scheduled.iter() {
            // pull the whole group out of its old bucket; jobs that
            // departed in the meantime are not in the queue anyway
            if let Some(at_bucket) = self.queue.get_mut(&bucket) {
                for (_, jobs) in sub_schedule {
                    for job in jobs {
                        at_bucket.remove(job);
                    }
                }
                if at_bucket.is_empty() {
                    self.queue.remove(&bucket);
                }
            }

            for (share, jobs) in sub_schedule {
                let live: HashSet<JobId> = jobs
                    .iter()
                    .copied()
                    .filter(|job| self.attained.contains_key(job))
                    .collect();
                if live.is_empty() {
                    continue;
                }
                let mut new_bucket = bucket + (share * delta as f64).ceil() as u64;
                // coalesce buckets differing by one unit of eps, to avoid
                // rounding-induced bucket proliferation
                let neighbors = [Some(new_bucket), new_bucket.checked_sub(1), Some(new_bucket + 1)];
                if let Some(existing) = neighbors
                    .iter()
                    .flatten()
                    .copied()
                    .find(|b| self.queue.contains_key(b))
                {
                    new_bucket = existing;
                }
                self.queue
                    .entry(new_bucket)
                    .or_insert_with(HashSet::new)
                    .extend(live.iter().copied());
                for job in live {
                    self.attained.insert(job, new_bucket);
                }
            }
        }

        self.last_t = t;
    }

    pub(super) fn attained_bucket(&self, job: JobId) -> Bucket {
        self.attained[&job]
    }

    pub(super) fn buckets(&self) -> impl Iterator<Item = (Bucket, &HashSet<JobId>)> {
        self.queue.iter().map(|(&b, jobs)| (b, jobs))
    }

    pub(super) fn bucket_count(&self) -> usize {
        self.queue.len()
    }

    pub(super) fn set_scheduled(&mut self, bucket: Bucket, share: f64, jobs: HashSet<JobId>) {
        self.scheduled.clear();
        self.scheduled.insert(bucket, vec![(share, jobs)]);
    }

    pub(super) fn clear_scheduled(&mut self) {
        self.scheduled.clear();
    }
}

impl Scheduler for Las {
    fn enqueue(&mut self, _t: Time, job: JobId, _size: f64) {
        self.queue.entry(0).or_insert_with(HashSet::new).insert(job);
        self.attained.insert(job, 0);
    }

    fn dequeue(&mut self, _t: Time, job: JobId) {
        let bucket = self
            .attained
            .remove(&job)
            .unwrap_or_else(|| panic!("dequeuing missing job {}", job));
        if let Some(at_bucket) = self.queue.get_mut(&bucket) {
            at_bucket.remove(&job);
            if at_bucket.is_empty() {
                self.queue.remove(&bucket);
            }
        }
    }

    fn schedule(&mut self, t: Time) -> Allocation {
        self.update(t);
        let front = self.queue.iter().next().map(|(&b, jobs)| (b, jobs.clone()));
        match front {
            Some((bucket, jobs)) => {
                let share = 1.0 / jobs.len() as f64;
                let alloc = equal_shares(jobs.iter().copied());
                self.set_scheduled(bucket, share, jobs);
                alloc
            }
            None => {
                self.clear_scheduled();
                Allocation::new()
            }
        }
    }

    fn next_internal_event(&self) -> Option<Duration> {
        let mut buckets = self.queue.iter();
        let (&running_bucket, running_jobs) = buckets.next()?;
        let (&waiting_bucket, _) = buckets.next()?;
        let diff = (waiting_bucket - running_bucket) as f64;
        Some(Duration(diff * running_jobs.len() as f64 * self.eps))
    }
}
