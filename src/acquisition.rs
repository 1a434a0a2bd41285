use tracing::*;

use crate::adc::{AdcBank, AdcDriver, CHANNEL_COUNT, ChannelId};

/// Per-channel minimum of the raw counts seen during the current measuring window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinHoldRegister {
    minima: [i16; CHANNEL_COUNT],
}

impl MinHoldRegister {
    /// Marks a channel that has not produced a sample in this window
    pub const SENTINEL: i16 = i16::MAX;

    pub const fn new() -> Self {
        Self {
            minima: [Self::SENTINEL; CHANNEL_COUNT],
        }
    }

    /// Keep the algebraic minimum of the held value and `raw`
    pub fn fold(&mut self, channel: ChannelId, raw: i16) {
        let held = &mut self.minima[channel.index()];
        *held = (*held).min(raw);
    }

    /// Held minimum, or `None` while the channel is still at the sentinel
    pub fn minimum(&self, channel: ChannelId) -> Option<i16> {
        match self.minima[channel.index()] {
            Self::SENTINEL => None,
            raw => Some(raw),
        }
    }

    pub fn reset(&mut self) {
        self.minima = [Self::SENTINEL; CHANNEL_COUNT];
    }

    pub fn raw(&self) -> &[i16; CHANNEL_COUNT] {
        &self.minima
    }
}

impl Default for MinHoldRegister {
    fn default() -> Self {
        Self::new()
    }
}

impl From<[i16; CHANNEL_COUNT]> for MinHoldRegister {
    fn from(minima: [i16; CHANNEL_COUNT]) -> Self {
        Self { minima }
    }
}

/// Reads every channel once per call and folds the readings into the min-hold register
#[derive(Debug)]
pub struct AcquisitionEngine<D: AdcDriver> {
    bank: AdcBank<D>,
    register: MinHoldRegister,
    failed_reads: u32,
}

impl<D: AdcDriver> AcquisitionEngine<D> {
    pub fn new(bank: AdcBank<D>) -> Self {
        Self {
            bank,
            register: MinHoldRegister::new(),
            failed_reads: 0,
        }
    }

    /// One pass over all 8 channels. Failed reads are skipped, not retried.
    pub fn sample(&mut self) {
        for channel in ChannelId::all() {
            match self.bank.read(channel) {
                Ok(raw) => self.register.fold(channel, raw),
                Err(err) => {
                    self.failed_reads = self.failed_reads.saturating_add(1);
                    debug!("Skipping {} reading: {err}", channel.field_name());
                }
            }
        }
    }

    pub fn register(&self) -> &MinHoldRegister {
        &self.register
    }

    /// Reads that failed since the last reset
    pub fn failed_reads(&self) -> u32 {
        self.failed_reads
    }

    /// Start a fresh window: all channels back to the sentinel
    pub fn reset(&mut self) {
        self.register.reset();
        self.failed_reads = 0;
    }
}
