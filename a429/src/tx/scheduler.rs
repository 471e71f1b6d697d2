use a429_driver::{opcode, Discrete, Transceiver};

use super::{Job, TxState};
use crate::callback::{CallbackQueue, Event};
use crate::channel::ChangeRequest;
use crate::config::Config;
use crate::consts::{TX_BUFFER_NUM, TX_JOBS_NUM};
use crate::core::{ChannelMode, JobCode, TxChannel};
use crate::rx::RxState;

/// Position and timing of a running job table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Scheduler {
    /// Last executed job
    pub job_index: usize,
    /// Position and dwell time of the pending jump, one level deep
    jump: Option<(usize, u8)>,
    /// Reference time of the last executed dwell job
    last_exec_time: u32,
    /// Dwell time of the last executed job in ms
    last_dwell: u32,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self {
            job_index: TX_JOBS_NUM - 1,
            jump: None,
            last_exec_time: 0,
            last_dwell: 0,
        }
    }
}

impl Scheduler {
    /// Rewinds to the first job, due at `now`
    pub fn start(&mut self, now: u32) {
        *self = Self {
            last_exec_time: now,
            ..Self::default()
        };
    }

    fn due(&self, now: u32) -> bool {
        now.wrapping_sub(self.last_exec_time) >= self.last_dwell
    }

    fn advance(&mut self) -> usize {
        self.job_index = (self.job_index + 1) % TX_JOBS_NUM;
        self.job_index
    }

    fn jump(&mut self, dwell: u8, target: usize) {
        self.jump = Some((self.job_index, dwell));
        self.job_index = (target + TX_JOBS_NUM - 1) % TX_JOBS_NUM;
    }

    /// Resumes after the pending jump, returning its dwell time
    fn ret(&mut self) -> Option<u8> {
        let (index, dwell) = self.jump.take()?;
        self.job_index = index;
        Some(dwell)
    }

    fn complete(&mut self, dwell: u8) {
        self.last_exec_time = self.last_exec_time.wrapping_add(self.last_dwell);
        self.last_dwell = u32::from(dwell);
    }
}

impl TxState {
    /// Executes due jobs of the job table
    ///
    /// Jobs run back to back until one carries a dwell time. Control jobs without a dwell time
    /// and zero-dwell jobs are capped per tick; when a cap is hit the pass ends with no dwell,
    /// so the table continues on the next tick.
    pub(crate) fn run_scheduler<C: Transceiver + ?Sized>(
        &mut self,
        channel: TxChannel,
        chip: &mut C,
        rx: &[RxState],
        callbacks: &mut CallbackQueue,
        config: &Config,
        now: u32,
    ) {
        if self.common.mode != ChannelMode::Run || self.common.pending() {
            return;
        }
        if !self.scheduler.due(now) {
            return;
        }

        let mut non_transmit_budget = config.non_transmit_budget;
        let mut zero_dwell_budget = config.zero_dwell_budget;
        let dwell = loop {
            let index = self.scheduler.advance();
            let (job, mut dwell) = self.jobs.get(index);
            match job.code {
                JobCode::Skip | JobCode::Dwell => {}
                JobCode::Stop => {
                    self.common.mode = ChannelMode::Active;
                    self.common.request(ChangeRequest::OPERATING_MODE);
                    info!("TX{} scheduler stopped at job {}", channel.index() + 1, index);
                    return;
                }
                JobCode::Jump => self.scheduler.jump(dwell, usize::from(job.index)),
                JobCode::Return => match self.scheduler.ret() {
                    Some(saved) => dwell = saved,
                    None => debug!("TX{} return without jump at job {}", channel.index() + 1, index),
                },
                JobCode::Callback => {
                    if !callbacks.enqueue(Event::Scheduler(channel), now as u16, job.index as u8) {
                        self.common.stats.count_lost();
                    }
                }
                JobCode::Single
                | JobCode::Cyclic
                | JobCode::RetransmitRx1
                | JobCode::RetransmitRx2 => self.transmit(channel, job, chip, rx),
            }

            if !job.code.uses_dwell_time() {
                non_transmit_budget = non_transmit_budget.saturating_sub(1);
                if non_transmit_budget > 0 {
                    continue;
                }
                break 0;
            }
            if dwell == 0 {
                zero_dwell_budget = zero_dwell_budget.saturating_sub(1);
                if zero_dwell_budget > 0 {
                    continue;
                }
            }
            break dwell;
        };
        self.scheduler.complete(dwell);
    }

    fn transmit<C: Transceiver + ?Sized>(
        &mut self,
        channel: TxChannel,
        job: Job,
        chip: &mut C,
        rx: &[RxState],
    ) {
        if chip.discrete(Discrete::TxFull) {
            self.common.stats.count_lost();
            return;
        }

        let frame = match job.code.retransmit_source() {
            Some(source) => match rx[source.index()].retransmit_frame(job.index) {
                Some(frame) => frame,
                None => return,
            },
            None => {
                let index = usize::from(job.index);
                if index >= TX_BUFFER_NUM || !self.eligible.get(index) {
                    self.common.stats.count_lost();
                    return;
                }
                if job.code == JobCode::Single {
                    self.eligible.clear(index);
                }
                self.frames[index]
            }
        };

        match chip.write_register(opcode::WRITE_TX_FIFO, &frame.to_be_bytes()) {
            Ok(()) => self.common.stats.count_processed(),
            Err(_) => {
                warn!("TX{} FIFO write failed", channel.index() + 1);
                self.common.stats.count_lost();
            }
        }
    }
}
