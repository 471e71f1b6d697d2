use crate::consts::TX_JOBS_NUM;
use crate::core::JobCode;

/// Scheduler job table entry
///
/// Packed into 16 bits as `code << 12 | index`. The index is a frame table index, a job
/// index, an extended label or user data depending on the code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Job {
    pub code: JobCode,
    pub index: u16,
}

impl Job {
    pub const INDEX_MASK: u16 = 0x0fff;
    const CODE_SHIFT: u32 = 12;

    pub const SKIP: Job = Job {
        code: JobCode::Skip,
        index: 0,
    };

    pub const fn new(code: JobCode, index: u16) -> Self {
        Self {
            code,
            index: index & Self::INDEX_MASK,
        }
    }

    pub const fn pack(self) -> u16 {
        (self.code.into_u8() as u16) << Self::CODE_SHIFT | self.index
    }

    /// Returns `None` for an undefined code
    pub const fn unpack(word: u16) -> Option<Self> {
        match JobCode::try_from_u8((word >> Self::CODE_SHIFT) as u8) {
            Some(code) => Some(Self::new(code, word)),
            None => None,
        }
    }
}

/// Scheduler program: packed jobs and their dwell times in ms
pub struct JobTable {
    entries: [u16; TX_JOBS_NUM],
    dwell: [u8; TX_JOBS_NUM],
    used: u16,
}

impl JobTable {
    pub fn new() -> Self {
        Self {
            entries: [Job::SKIP.pack(); TX_JOBS_NUM],
            dwell: [0; TX_JOBS_NUM],
            used: 0,
        }
    }

    pub fn get(&self, index: usize) -> (Job, u8) {
        let job = Job::unpack(self.entries[index]).unwrap_or(Job::SKIP);
        (job, self.dwell[index])
    }

    pub fn set(&mut self, index: usize, job: Job, dwell: u8) {
        let was_used = self.get(index).0.code != JobCode::Skip;
        let is_used = job.code != JobCode::Skip;
        match (was_used, is_used) {
            (false, true) => self.used += 1,
            (true, false) => self.used -= 1,
            _ => {}
        }
        self.entries[index] = job.pack();
        self.dwell[index] = dwell;
    }

    /// Resets the entries `first..=last` to skip jobs
    pub fn clear(&mut self, first: usize, last: usize) {
        for index in first..=last {
            self.set(index, Job::SKIP, 0);
        }
    }

    /// Number of entries other than skip jobs
    pub fn used(&self) -> u16 {
        self.used
    }
}

impl Default for JobTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_packing() {
        let job = Job::new(JobCode::Jump, 999);
        assert_eq!(job.pack(), 0x33e7);
        assert_eq!(Job::unpack(0x33e7), Some(job));
        assert_eq!(Job::unpack(0xa000), None);
        assert_eq!(Job::new(JobCode::Callback, 0x1fff).index, 0x0fff);
    }

    #[test]
    fn test_used_count() {
        let mut table = JobTable::new();
        table.set(0, Job::new(JobCode::Single, 1), 10);
        table.set(1, Job::new(JobCode::Stop, 0), 0);
        table.set(1, Job::new(JobCode::Dwell, 0), 5);
        assert_eq!(table.used(), 2);
        assert_eq!(table.get(1), (Job::new(JobCode::Dwell, 0), 5));

        table.clear(0, TX_JOBS_NUM - 1);
        assert_eq!(table.used(), 0);
        assert_eq!(table.get(0), (Job::SKIP, 0));
    }
}
