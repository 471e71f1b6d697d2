//! Host command API
//!
//! Every command validates all of its parameters before it touches any state, so a rejected
//! command has no effect. Commands only stage settings and request their application; the chip
//! is written by the next tick.

use core::ops::Range;

use a429_driver::Transceiver;
use heapless::Vec;

use crate::bridge::Bridge;
use crate::channel::{ChangeRequest, ChannelState};
use crate::consts::{RX_BUFFER_USABLE, TX_BUFFER_NUM, TX_JOBS_NUM};
use crate::core::{
    A429Mode, CallbackMode, Channel, ChannelMode, ChannelSelector, ExtendedLabel, FrameMode,
    JobCode, Label, Parity, RxChannel, SdiMode, Speed, TxChannel, RX_CHANNEL_COUNT,
};
use crate::debug::{self, Discretes, RwError};
use crate::rx::ReadFrame;
use crate::tx::Job;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandError {
    /// The selector addresses no channel the command applies to
    InvalidChannel,
    /// A parameter is out of range
    InvalidParameter,
    Debug(RwError),
}

impl From<RwError> for CommandError {
    fn from(value: RwError) -> Self {
        CommandError::Debug(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Capabilities {
    pub tx_jobs_total: u16,
    pub tx_jobs_used: u16,
    /// Frame buffers per RX channel available to filters
    pub rx_buffers_total: u16,
    pub rx_buffers_used: [u16; RX_CHANNEL_COUNT],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HeartbeatConfiguration {
    pub mode: CallbackMode,
    /// Period in ms
    pub period: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelConfiguration {
    pub parity: Parity,
    pub speed: Speed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RxCallbackConfiguration {
    pub mode: CallbackMode,
    /// Frame timeout in ms, zero disables timeouts
    pub timeout: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScheduleEntry {
    pub job: JobCode,
    pub frame_index: u16,
    /// Frame table entry of single and cyclic jobs, zero otherwise
    pub frame: u32,
    pub dwell: u8,
}

fn tx_range(selector: ChannelSelector) -> Result<Range<usize>, CommandError> {
    selector.tx_range().ok_or(CommandError::InvalidChannel)
}

fn rx_range(selector: ChannelSelector) -> Result<Range<usize>, CommandError> {
    selector.rx_range().ok_or(CommandError::InvalidChannel)
}

fn single_tx(selector: ChannelSelector) -> Result<TxChannel, CommandError> {
    match selector.single() {
        Some(Channel::Tx(tx)) => Ok(tx),
        _ => Err(CommandError::InvalidChannel),
    }
}

fn single_rx(selector: ChannelSelector) -> Result<RxChannel, CommandError> {
    match selector.single() {
        Some(Channel::Rx(rx)) => Ok(rx),
        _ => Err(CommandError::InvalidChannel),
    }
}

fn check_frame_index(index: u16) -> Result<usize, CommandError> {
    let index = usize::from(index);
    if index < TX_BUFFER_NUM {
        Ok(index)
    } else {
        Err(CommandError::InvalidParameter)
    }
}

fn check_job_index(index: u16) -> Result<usize, CommandError> {
    let index = usize::from(index);
    if index < TX_JOBS_NUM {
        Ok(index)
    } else {
        Err(CommandError::InvalidParameter)
    }
}

/// Range check of the job index field, which names a different table for each code
fn check_job(code: JobCode, index: u16) -> Result<Job, CommandError> {
    let limit = match code {
        JobCode::Skip | JobCode::Stop | JobCode::Return | JobCode::Dwell => usize::MAX,
        JobCode::Callback => usize::from(u8::MAX) + 1,
        JobCode::Jump => TX_JOBS_NUM,
        JobCode::Single | JobCode::Cyclic => TX_BUFFER_NUM,
        JobCode::RetransmitRx1 | JobCode::RetransmitRx2 => ExtendedLabel::COUNT,
    };
    if usize::from(index) >= limit || index > Job::INDEX_MASK {
        return Err(CommandError::InvalidParameter);
    }
    Ok(Job::new(code, index))
}

impl Bridge {
    fn commons_mut(&mut self, selector: ChannelSelector) -> impl Iterator<Item = &mut ChannelState> {
        let tx = selector.tx_range().unwrap_or(0..0);
        let rx = selector.rx_range().unwrap_or(0..0);
        self.tx[tx]
            .iter_mut()
            .map(|tx| &mut tx.common)
            .chain(self.rx[rx].iter_mut().map(|rx| &mut rx.common))
    }

    fn common(&self, selector: ChannelSelector) -> Result<&ChannelState, CommandError> {
        match selector.single().ok_or(CommandError::InvalidChannel)? {
            Channel::Tx(tx) => Ok(&self.tx[tx.index()].common),
            Channel::Rx(rx) => Ok(&self.rx[rx.index()].common),
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            tx_jobs_total: TX_JOBS_NUM as u16,
            tx_jobs_used: self.tx.iter().map(|tx| tx.jobs.used()).sum(),
            rx_buffers_total: RX_BUFFER_USABLE as u16,
            rx_buffers_used: core::array::from_fn(|index| self.rx[index].buffers.used()),
        }
    }

    /// Reconfigures the heartbeat and starts a new statistics epoch on every channel
    pub fn set_heartbeat_configuration(&mut self, mode: CallbackMode, period: u16) {
        self.heartbeat.configure(mode, period);
        self.tx.iter_mut().for_each(|tx| tx.common.stats.reset());
        self.rx.iter_mut().for_each(|rx| rx.common.stats.reset());
    }

    pub fn heartbeat_configuration(&self) -> HeartbeatConfiguration {
        HeartbeatConfiguration {
            mode: self.heartbeat.mode,
            period: self.heartbeat.period,
        }
    }

    pub fn set_channel_configuration(
        &mut self,
        selector: ChannelSelector,
        parity: Parity,
        speed: Speed,
    ) {
        for common in self.commons_mut(selector) {
            common.parity = parity;
            common.speed = speed;
            common.request(ChangeRequest::SPEED_PARITY);
        }
    }

    pub fn channel_configuration(
        &self,
        selector: ChannelSelector,
    ) -> Result<ChannelConfiguration, CommandError> {
        let common = self.common(selector)?;
        Ok(ChannelConfiguration {
            parity: common.parity,
            speed: common.speed,
        })
    }

    /// Sets the operating mode, `Run` being valid for TX channels only
    pub fn set_channel_mode(
        &mut self,
        selector: ChannelSelector,
        mode: ChannelMode,
    ) -> Result<(), CommandError> {
        if mode == ChannelMode::Run && selector.rx_range().is_some() {
            return Err(CommandError::InvalidParameter);
        }
        for common in self.commons_mut(selector) {
            common.mode = mode;
            common.request(ChangeRequest::OPERATING_MODE);
        }
        Ok(())
    }

    pub fn channel_mode(&self, selector: ChannelSelector) -> Result<ChannelMode, CommandError> {
        Ok(self.common(selector)?.mode)
    }

    pub fn clear_all_rx_filters(&mut self, selector: ChannelSelector) -> Result<(), CommandError> {
        for rx in &mut self.rx[rx_range(selector)?] {
            rx.clear_filters();
        }
        Ok(())
    }

    /// Returns whether a filter was removed on every selected channel
    pub fn clear_rx_filter(
        &mut self,
        selector: ChannelSelector,
        label: Label,
        sdi: SdiMode,
    ) -> Result<bool, CommandError> {
        let mut cleared = true;
        for rx in &mut self.rx[rx_range(selector)?] {
            cleared &= rx.clear_filter(label, sdi);
        }
        Ok(cleared)
    }

    /// Installs an SDI-as-data filter for every label buffers are left for
    pub fn set_rx_standard_filters(&mut self, selector: ChannelSelector) -> Result<(), CommandError> {
        let now = self.now as u16;
        for rx in &mut self.rx[rx_range(selector)?] {
            rx.set_standard_filters(now);
        }
        Ok(())
    }

    /// Returns whether the filter could be installed on every selected channel
    pub fn set_rx_filter(
        &mut self,
        selector: ChannelSelector,
        label: Label,
        sdi: SdiMode,
    ) -> Result<bool, CommandError> {
        let now = self.now as u16;
        let mut success = true;
        for rx in &mut self.rx[rx_range(selector)?] {
            success &= rx.set_filter(label, sdi, now);
        }
        Ok(success)
    }

    pub fn rx_filter(
        &self,
        selector: ChannelSelector,
        label: Label,
        sdi: SdiMode,
    ) -> Result<bool, CommandError> {
        let rx = single_rx(selector)?;
        Ok(self.rx[rx.index()].has_filter(label, sdi))
    }

    pub fn read_frame(
        &self,
        selector: ChannelSelector,
        label: Label,
        sdi: SdiMode,
    ) -> Result<ReadFrame, CommandError> {
        let rx = single_rx(selector)?;
        Ok(self.rx[rx.index()].read_frame(label, sdi, self.now as u16))
    }

    pub fn set_rx_callback_configuration(
        &mut self,
        selector: ChannelSelector,
        mode: CallbackMode,
        timeout: u16,
    ) -> Result<(), CommandError> {
        for rx in &mut self.rx[rx_range(selector)?] {
            rx.common.callback_mode = mode;
            rx.timeout_period = timeout;
            rx.common.request(ChangeRequest::CALLBACK_MODE);
        }
        Ok(())
    }

    pub fn rx_callback_configuration(
        &self,
        selector: ChannelSelector,
    ) -> Result<RxCallbackConfiguration, CommandError> {
        let rx = &self.rx[single_rx(selector)?.index()];
        Ok(RxCallbackConfiguration {
            mode: rx.common.callback_mode,
            timeout: rx.timeout_period,
        })
    }

    /// Queues a frame for immediate transmission; a full queue counts it lost
    pub fn write_frame_direct(
        &mut self,
        selector: ChannelSelector,
        frame: u32,
    ) -> Result<(), CommandError> {
        for tx in &mut self.tx[tx_range(selector)?] {
            tx.write_direct(frame);
        }
        Ok(())
    }

    /// Stores a frame in the scheduled frame table and arms it
    pub fn write_frame_scheduled(
        &mut self,
        selector: ChannelSelector,
        frame_index: u16,
        frame: u32,
    ) -> Result<(), CommandError> {
        let range = tx_range(selector)?;
        let index = check_frame_index(frame_index)?;
        for tx in &mut self.tx[range] {
            tx.write_scheduled(index, frame);
        }
        Ok(())
    }

    pub fn set_frame_mode(
        &mut self,
        selector: ChannelSelector,
        frame_index: u16,
        mode: FrameMode,
    ) -> Result<(), CommandError> {
        let range = tx_range(selector)?;
        let index = check_frame_index(frame_index)?;
        for tx in &mut self.tx[range] {
            tx.set_frame_mode(index, mode);
        }
        Ok(())
    }

    /// Turns the jobs `first..=last` into skip jobs
    pub fn clear_schedule_entries(
        &mut self,
        selector: ChannelSelector,
        first: u16,
        last: u16,
    ) -> Result<(), CommandError> {
        let range = tx_range(selector)?;
        let last = check_job_index(last)?;
        let first = usize::from(first);
        if first > last {
            return Err(CommandError::InvalidParameter);
        }
        for tx in &mut self.tx[range] {
            tx.jobs.clear(first, last);
        }
        Ok(())
    }

    pub fn set_schedule_entry(
        &mut self,
        selector: ChannelSelector,
        job_index: u16,
        job: JobCode,
        frame_index: u16,
        dwell: u8,
    ) -> Result<(), CommandError> {
        let range = tx_range(selector)?;
        let index = check_job_index(job_index)?;
        let job = check_job(job, frame_index)?;
        for tx in &mut self.tx[range] {
            tx.jobs.set(index, job, dwell);
        }
        Ok(())
    }

    pub fn schedule_entry(
        &self,
        selector: ChannelSelector,
        job_index: u16,
    ) -> Result<ScheduleEntry, CommandError> {
        let tx = &self.tx[single_tx(selector)?.index()];
        let (job, dwell) = tx.jobs.get(check_job_index(job_index)?);
        let frame = match job.code {
            JobCode::Single | JobCode::Cyclic => tx
                .frames
                .get(usize::from(job.index))
                .copied()
                .unwrap_or(0),
            _ => 0,
        };
        Ok(ScheduleEntry {
            job: job.code,
            frame_index: job.index,
            frame,
            dwell,
        })
    }

    /// Requests a data and chip reset, carried out by the next tick
    pub fn restart(&mut self) {
        self.system.reset_data = true;
        self.system.reset_chip = true;
    }

    /// Leaving the debug mode re-applies every channel setting, as registers may have been
    /// written directly
    pub fn set_a429_mode(&mut self, mode: A429Mode) {
        if self.system.mode == A429Mode::Debug && mode == A429Mode::Normal {
            self.commons_mut(ChannelSelector::AllTx)
                .for_each(|common| common.request(ChangeRequest::ALL));
            self.commons_mut(ChannelSelector::AllRx)
                .for_each(|common| common.request(ChangeRequest::ALL));
        }
        if self.system.mode != mode {
            info!("A429 mode {:?}", mode);
        }
        self.system.mode = mode;
    }

    pub fn a429_mode(&self) -> A429Mode {
        self.system.mode
    }

    /// Low-level access works in either mode. In `Normal` mode the bridge keeps driving the
    /// chip between calls.
    pub fn debug_discretes<C: Transceiver + ?Sized>(&self, chip: &mut C) -> Discretes {
        debug::discretes(chip)
    }

    pub fn debug_read_register<C: Transceiver + ?Sized>(
        &self,
        chip: &mut C,
        opcode: u8,
    ) -> Result<Vec<u8, { a429_driver::opcode::MAX_DATA_LENGTH }>, CommandError> {
        Ok(debug::read_register(chip, opcode)?)
    }

    pub fn debug_write_register<C: Transceiver + ?Sized>(
        &self,
        chip: &mut C,
        opcode: u8,
        data: &[u8],
    ) -> Result<(), CommandError> {
        Ok(debug::write_register(chip, opcode, data)?)
    }
}
