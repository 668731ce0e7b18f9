use std::collections::HashSet;
use std::iter;

use super::Scheduler;
use crate::types::{Allocation, Duration, JobId, Time};

/// One entry of the virtual queue, keyed by remaining *virtual* work.
#[derive(Debug, Clone, Copy)]
struct VirtualEntry {
    v_remaining: f64,
    job: JobId,
}

/// The fictitious processor-sharing scheduler whose completion order is the
/// target order for the real server. Jobs stay in here until the virtual
/// scheduler finishes them, which may be after their real completion.
#[derive(Debug)]
struct VirtualPs {
    // sorted by (v_remaining, job)
    queue: Vec<VirtualEntry>,
    eps: f64,
    last_t: Time,
}

impl VirtualPs {
    fn new(eps: f64) -> Self {
        VirtualPs {
            queue: Vec::new(),
            eps,
            last_t: Time::default(),
        }
    }

    /// Advance the virtual clock to `t`, reporting every job the virtual
    /// scheduler finished along the way.
    fn advance(&mut self, t: Time, mut finished: impl FnMut(JobId)) {
        let delta = (t - self.last_t).0;

        if !self.queue.is_empty() {
            let fair_share = delta / self.queue.len() as f64;
            let fair_plus_eps = fair_share + self.eps;

            let done = self
                .queue
                .iter()
                .take_while(|e| e.v_remaining <= fair_plus_eps)
                .count();
            for entry in self.queue.drain(..done) {
                finished(entry.job);
            }

            if fair_share > 0.0 {
                for entry in &mut self.queue {
                    entry.v_remaining -= fair_share;
                }
            }
        }

        self.last_t = t;
    }

    fn insert(&mut self, job: JobId, size: f64) {
        let at = self.queue.partition_point(|e| {
            e.v_remaining.total_cmp(&size).then(e.job.cmp(&job)).is_lt()
        });
        self.queue.insert(at, VirtualEntry { v_remaining: size, job });
    }

    /// First job in virtual order that is still really present.
    fn first_running(&self, running: &HashSet<JobId>) -> Option<JobId> {
        self.queue.iter().map(|e| e.job).find(|j| running.contains(j))
    }

    /// Virtual time to the next virtual completion.
    fn next_completion(&self) -> Option<Duration> {
        let head = self.queue.first()?;
        Some(Duration(head.v_remaining * self.queue.len() as f64))
    }
}

/// Fair sojourn protocol: run jobs to completion in the order the virtual
/// processor-sharing scheduler would finish them. With exact sizes no job is
/// ever late; under misestimation, virtually-finished jobs that still have
/// real work left are served first, oldest first.
#[derive(Debug)]
pub struct Fsp {
    virt: VirtualPs,
    /// jobs present in the real system
    running: HashSet<JobId>,
    /// virtually finished but still present, in the order they became late
    late: Vec<JobId>,
}

impl Fsp {
    pub fn new(eps: f64) -> Self {
        Fsp {
            virt: VirtualPs::new(eps),
            running: HashSet::new(),
            late: Vec::new(),
        }
    }

    pub(super) fn update(&mut self, t: Time) {
        let running = &self.running;
        let late = &mut self.late;
        self.virt.advance(t, |job| {
            if running.contains(&job) {
                late.push(job);
            }
        });
    }

    /// The allocation at the current virtual clock; callers must have run
    /// `update` first.
    pub(super) fn pick(&self) -> Allocation {
        if let Some(&job) = self.late.first() {
            return iter::once((job, 1.0)).collect();
        }
        if self.running.is_empty() {
            return Allocation::new();
        }
        let job = self
            .virt
            .first_running(&self.running)
            .expect("present job missing from virtual queue");
        iter::once((job, 1.0)).collect()
    }

    pub(super) fn late_jobs(&self) -> &[JobId] {
        &self.late
    }
}

impl Scheduler for Fsp {
    fn enqueue(&mut self, t: Time, job: JobId, size: f64) {
        // age only the jobs that were already in the virtual queue
        self.update(t);
        self.virt.insert(job, size);
        self.running.insert(job);
    }

    fn dequeue(&mut self, _t: Time, job: JobId) {
        // the job remains in the virtual scheduler!
        if !self.running.remove(&job) {
            panic!("dequeuing missing job {}", job);
        }
        if let Some(idx) = self.late.iter().position(|&j| j == job) {
            self.late.remove(idx);
        }
    }

    fn schedule(&mut self, t: Time) -> Allocation {
        self.update(t);
        self.pick()
    }

    fn next_internal_event(&self) -> Option<Duration> {
        self.virt.next_completion()
    }
}

/// FSP except that late jobs share the server equally instead of being
/// served oldest-first; lateness is a plain membership test here.
#[derive(Debug)]
pub struct FspPs {
    virt: VirtualPs,
    running: HashSet<JobId>,
    late: HashSet<JobId>,
}

impl FspPs {
    pub fn new(eps: f64) -> Self {
        FspPs {
            virt: VirtualPs::new(eps),
            running: HashSet::new(),
            late: HashSet::new(),
        }
    }

    fn update(&mut self, t: Time) {
        let running = &self.running;
        let late = &mut self.late;
        self.virt.advance(t, |job| {
            if running.contains(&job) {
                late.insert(job);
            }
        });
    }
}

impl Scheduler for FspPs {
    fn enqueue(&mut self, t: Time, job: JobId, size: f64) {
        self.update(t);
        self.virt.insert(job, size);
        self.running.insert(job);
    }

    fn dequeue(&mut self, _t: Time, job: JobId) {
        if !self.running.remove(&job) {
            panic!("dequeuing missing job {}", job);
        }
        self.late.remove(&job);
    }

    fn schedule(&mut self, t: Time) -> Allocation {
        self.update(t);
        if !self.late.is_empty() {
            return super::equal_shares(self.late.iter().copied());
        }
        if self.running.is_empty() {
            return Allocation::new();
        }
        let job = self
            .virt
            .first_running(&self.running)
            .expect("present job missing from virtual queue");
        iter::once((job, 1.0)).collect()
    }

    fn next_internal_event(&self) -> Option<Duration> {
        self.virt.next_completion()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn follows_virtual_finish_order() {
        let mut fsp = Fsp::new(1e-6);
        fsp.enqueue(Time(0.0), JobId(0), 2.0);
        fsp.enqueue(Time(0.0), JobId(1), 1.0);
        // the virtual PS finishes job 1 first, so the real server runs it
        assert_eq!(fsp.schedule(Time(0.0))[&JobId(1)], 1.0);
        // the virtual completion of job 1 is 1 * 2 jobs away
        assert_eq!(fsp.next_internal_event(), Some(Duration(2.0)));
        fsp.dequeue(Time(1.0), JobId(1));
        assert_eq!(fsp.schedule(Time(1.0))[&JobId(0)], 1.0);
        fsp.dequeue(Time(3.0), JobId(0));
        assert!(fsp.schedule(Time(3.0)).is_empty());
    }

    #[test]
    fn departed_jobs_age_out_of_virtual_queue() {
        let mut fsp = Fsp::new(1e-6);
        fsp.enqueue(Time(0.0), JobId(0), 2.0);
        fsp.enqueue(Time(0.0), JobId(1), 1.0);
        fsp.schedule(Time(0.0));
        // job 1 completes for real at t=1 but virtually at t=2; the virtual
        // entry is skipped when picking the next real job
        fsp.dequeue(Time(1.0), JobId(1));
        assert_eq!(fsp.schedule(Time(1.0))[&JobId(0)], 1.0);
        assert_eq!(fsp.virt.queue.len(), 2);
        // by t=2 the virtual PS has finished job 1 as well
        fsp.schedule(Time(2.0));
        assert_eq!(fsp.virt.queue.len(), 1);
    }

    #[test]
    fn underestimated_job_turns_late() {
        let mut fsp = Fsp::new(1e-6);
        // announced size 1, real size larger: still running at t=2 when the
        // virtual scheduler has long finished it
        fsp.enqueue(Time(0.0), JobId(0), 1.0);
        fsp.enqueue(Time(0.0), JobId(1), 4.0);
        fsp.schedule(Time(0.0));
        let alloc = fsp.schedule(Time(2.5));
        assert_eq!(alloc[&JobId(0)], 1.0);
        assert_eq!(fsp.late_jobs(), &[JobId(0)]);
        // once it really finishes, the late set empties
        fsp.dequeue(Time(3.0), JobId(0));
        assert_eq!(fsp.schedule(Time(3.0))[&JobId(1)], 1.0);
        assert!(fsp.late_jobs().is_empty());
    }

    #[test]
    fn oldest_late_job_first() {
        let mut fsp = Fsp::new(1e-6);
        fsp.enqueue(Time(0.0), JobId(0), 1.0);
        fsp.enqueue(Time(0.0), JobId(1), 2.0);
        fsp.enqueue(Time(0.0), JobId(2), 10.0);
        fsp.schedule(Time(0.0));
        // both 0 and 1 are virtually done by t=7 but neither really finished
        fsp.schedule(Time(7.0));
        assert_eq!(fsp.late_jobs(), &[JobId(0), JobId(1)]);
        assert_eq!(fsp.schedule(Time(7.0))[&JobId(0)], 1.0);
    }

    #[test]
    fn late_share_equally_in_ps_variant() {
        let mut fsp = FspPs::new(1e-6);
        fsp.enqueue(Time(0.0), JobId(0), 1.0);
        fsp.enqueue(Time(0.0), JobId(1), 2.0);
        fsp.enqueue(Time(0.0), JobId(2), 10.0);
        fsp.schedule(Time(0.0));
        let alloc = fsp.schedule(Time(7.0));
        assert_eq!(alloc.len(), 2);
        assert_relative_eq!(alloc[&JobId(0)], 0.5);
        assert_relative_eq!(alloc[&JobId(1)], 0.5);
    }

    #[test]
    #[should_panic(expected = "dequeuing missing job")]
    fn dequeue_missing() {
        let mut fsp = Fsp::new(1e-6);
        fsp.dequeue(Time(0.0), JobId(0));
    }
}
