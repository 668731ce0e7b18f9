use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use educe::Educe;
use parse_display::Display;

use crate::estimation::SizeEstimator;
use crate::schedulers::Scheduler;
use crate::types::{Allocation, Completion, Duration, JobId, Time, WorkloadJob};
use crate::utils::float;
use crate::utils::logging::prelude::*;

/// Assertion window for driver-level float bookkeeping.
pub const EPS_DRIVER: f64 = 1e-3;

/// Events processed by the driver, ordered by time, then kind (arrivals
/// before completions), then job.
#[derive(Debug, Clone, Display, Educe)]
#[educe(PartialEq, Eq, PartialOrd, Ord)]
#[display("@{time:.2} -> {kind}")]
pub struct Event {
    pub time: Time,
    pub kind: EventKind,
}

#[derive(Debug, Clone, Display, Educe)]
#[educe(PartialEq, Eq, PartialOrd, Ord)]
pub enum EventKind {
    /// A job enters the system; `size` is the true size, which takes no
    /// part in event ordering.
    #[display("Arrival({job}, {size:.2})")]
    Arrival {
        job: JobId,
        #[educe(PartialEq(ignore))]
        #[educe(PartialOrd(ignore))]
        #[educe(Ord(ignore))]
        size: f64,
    },
    /// The predicted completion of `job`.
    #[display("Complete({job})")]
    Complete { job: JobId },
}

/// The event-driven simulation of one policy over one workload.
///
/// Iterating yields `Completion`s in nondecreasing time order; when the
/// iterator is exhausted every admitted job has completed.
pub struct Simulation {
    future_events: BinaryHeap<Reverse<Event>>,
    /// true work left per admitted job; the policy never sees these
    remaining: HashMap<JobId, f64>,
    allocation: Allocation,
    policy: Box<dyn Scheduler>,
    estimator: Box<dyn SizeEstimator>,
    last_t: Time,
}

impl Simulation {
    pub fn new(
        jobs: impl IntoIterator<Item = WorkloadJob>,
        policy: Box<dyn Scheduler>,
        estimator: Box<dyn SizeEstimator>,
    ) -> Self {
        let future_events = jobs
            .into_iter()
            .map(|j| {
                Reverse(Event {
                    time: j.arrival,
                    kind: EventKind::Arrival { job: j.id, size: j.size },
                })
            })
            .collect();
        Simulation {
            future_events,
            remaining: HashMap::new(),
            allocation: Allocation::new(),
            policy,
            estimator,
            last_t: Time::default(),
        }
    }

    /// One iteration of the simulation loop.
    fn handle(&mut self, event: Event) -> Option<Completion> {
        let t = event.time;
        let delta = t - self.last_t;

        // drain work from every allocated job; this is the only place
        // remaining work is consumed
        for (job, share) in &self.allocation {
            let remaining = self
                .remaining
                .get_mut(job)
                .expect("allocated job is not admitted");
            *remaining -= delta.0 * share;
            debug_assert!(
                *remaining > -EPS_DRIVER,
                "job {} over-serviced: {} left",
                job,
                remaining
            );
        }

        trace!(time = %t, %event, "handling event");

        let completed = match event.kind {
            EventKind::Arrival { job, size } => {
                self.remaining.insert(job, size);
                let announced = self.estimator.estimate(size);
                self.policy.enqueue(t, job, announced);
                None
            }
            EventKind::Complete { job } => {
                let left = self
                    .remaining
                    .remove(&job)
                    .expect("completing a job that is not admitted");
                debug_assert!(
                    left.abs() <= EPS_DRIVER,
                    "job {} completed with {} work left",
                    job,
                    left
                );
                self.policy.dequeue(t, job);
                Some(Completion { time: t, job })
            }
        };

        self.allocation = self.policy.schedule(t);
        self.check_allocation();

        // predict the next completion under the new allocation, and
        // materialize it only if it precedes everything already queued.
        // That guarantees at most one live Complete event in the heap: the
        // next loop iteration consumes it before another can be pushed.
        if !self.remaining.is_empty() {
            let (next_delta, job) = self
                .allocation
                .iter()
                .map(|(&job, &share)| {
                    let remaining = self.remaining[&job];
                    (remaining / share, job)
                })
                .min_by(|a, b| float::total_cmp(&a.0, &b.0).then(a.1.cmp(&b.1)))
                .expect("allocation is empty while jobs remain");
            let next_complete = t + Duration(next_delta);
            let before_queue = self
                .future_events
                .peek()
                .map(|Reverse(e)| e.time > next_complete)
                .unwrap_or(true);
            if before_queue {
                self.future_events.push(Reverse(Event {
                    time: next_complete,
                    kind: EventKind::Complete { job },
                }));
            }
        }

        self.last_t = t;
        completed
    }

    #[cfg(debug_assertions)]
    fn check_allocation(&self) {
        use crate::schedulers::EPS;

        let total: f64 = self.allocation.values().sum();
        debug_assert!(total <= 1.0 + EPS, "allocation over capacity: {}", total);
        debug_assert!(
            self.remaining.is_empty() || total >= 1.0 - EPS,
            "allocation under capacity with jobs present: {}",
            total
        );
        debug_assert!(self.allocation.values().all(|&share| share > 0.0));
    }

    #[cfg(not(debug_assertions))]
    fn check_allocation(&self) {}
}

impl Iterator for Simulation {
    type Item = Completion;

    fn next(&mut self) -> Option<Completion> {
        while let Some(Reverse(event)) = self.future_events.pop() {
            if let Some(done) = self.handle(event) {
                return Some(done);
            }
        }
        debug_assert!(
            self.remaining.is_empty(),
            "events exhausted with {} jobs still admitted",
            self.remaining.len()
        );
        None
    }
}
