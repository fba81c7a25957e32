use std::collections::BTreeMap;

/// Outcome of one `resume` step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobProgress<T> {
    Pending,
    Done(T),
}

/// A resumable computation that performs one bounded unit of work per
/// `resume` instead of running to completion synchronously.
///
/// Jobs only *read* the world while iterating; results are committed by the
/// owner once the job reports `Done`. A job that has produced `Done` must not
/// be resumed again — [`JobScheduler`] upholds this structurally.
pub trait Job<W: ?Sized>: 'static {
    type Output;

    fn resume(&mut self, world: &W) -> JobProgress<Self::Output>;
}

/// Handle to a job owned by a [`JobScheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobId(u64);

enum JobSlot<W: ?Sized, T> {
    Running(Box<dyn Job<W, Output = T>>),
    Finished(T),
}

/// Owns live jobs and drives them cooperatively.
///
/// `pump` resumes every running job at most `resumes_per_job` times, so a
/// single call performs a bounded amount of work regardless of how much
/// search state the jobs hold. Owners collect results with `try_take`;
/// dropping a handle without collecting (or calling `cancel`) abandons the
/// job with no further side effects.
pub struct JobScheduler<W: ?Sized, T> {
    slots: BTreeMap<u64, JobSlot<W, T>>,
    next_id: u64,
    resumes_per_job: u32,
}

impl<W: ?Sized + 'static, T: 'static> JobScheduler<W, T> {
    pub fn new(resumes_per_job: u32) -> Self {
        Self {
            slots: BTreeMap::new(),
            next_id: 0,
            resumes_per_job: resumes_per_job.max(1),
        }
    }

    pub fn start(&mut self, job: Box<dyn Job<W, Output = T>>) -> JobId {
        let id = self.next_id;
        self.next_id += 1;
        self.slots.insert(id, JobSlot::Running(job));
        JobId(id)
    }

    /// Resume every running job, each at most `resumes_per_job` times.
    ///
    /// Finished jobs keep their result until the owner takes it; they are
    /// never resumed again.
    pub fn pump(&mut self, world: &W) {
        for slot in self.slots.values_mut() {
            let finished = match slot {
                JobSlot::Running(job) => {
                    let mut result = None;
                    for _ in 0..self.resumes_per_job {
                        if let JobProgress::Done(value) = job.resume(world) {
                            result = Some(value);
                            break;
                        }
                    }
                    result
                }
                JobSlot::Finished(_) => None,
            };

            if let Some(value) = finished {
                *slot = JobSlot::Finished(value);
            }
        }
    }

    /// Take the result of a finished job, removing it from the scheduler.
    ///
    /// Returns `None` while the job is still running or if the handle is
    /// unknown (already taken or cancelled).
    pub fn try_take(&mut self, id: JobId) -> Option<T> {
        if !matches!(self.slots.get(&id.0), Some(JobSlot::Finished(_))) {
            return None;
        }

        match self.slots.remove(&id.0) {
            Some(JobSlot::Finished(value)) => Some(value),
            _ => None,
        }
    }

    /// Abandon a job. The search state is dropped; no result is produced.
    pub fn cancel(&mut self, id: JobId) {
        self.slots.remove(&id.0);
    }

    pub fn is_running(&self, id: JobId) -> bool {
        matches!(self.slots.get(&id.0), Some(JobSlot::Running(_)))
    }

    pub fn is_finished(&self, id: JobId) -> bool {
        matches!(self.slots.get(&id.0), Some(JobSlot::Finished(_)))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
