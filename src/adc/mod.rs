use std::fmt::Debug;

use thiserror::Error;
use tracing::*;

use crate::config::{ADC_A_ADDRESS, ADC_B_ADDRESS};

#[cfg(feature = "sim")]
pub mod sim;

/// Number of logical channels spread over both converters
pub const CHANNEL_COUNT: usize = 8;
/// Single-ended inputs per converter
pub const SUB_CHANNELS_PER_DEVICE: u8 = 4;

/// One of the two 4-channel converters on the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Device {
    A,
    B,
}

impl Device {
    pub const fn address(self) -> u8 {
        match self {
            Device::A => ADC_A_ADDRESS,
            Device::B => ADC_B_ADDRESS,
        }
    }
}

/// Physical input a logical channel is wired to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhysicalChannel {
    pub device: Device,
    pub sub_channel: u8,
}

/// Logical channel index, always below [`CHANNEL_COUNT`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ChannelId(usize);

/// Payload field names, indexed by logical channel
const FIELD_NAMES: [&str; CHANNEL_COUNT] = ["X1", "X2", "Y1", "Y2", "D1", "D2", "Z1", "Z2"];

impl ChannelId {
    pub const fn new(index: usize) -> Option<Self> {
        if index < CHANNEL_COUNT {
            Some(Self(index))
        } else {
            None
        }
    }

    pub const fn index(self) -> usize {
        self.0
    }

    /// Channels 0-3 live on device A, 4-7 on device B, sub-channels in order
    pub const fn physical(self) -> PhysicalChannel {
        let per_device = SUB_CHANNELS_PER_DEVICE as usize;
        if self.0 < per_device {
            PhysicalChannel {
                device: Device::A,
                sub_channel: self.0 as u8,
            }
        } else {
            PhysicalChannel {
                device: Device::B,
                sub_channel: (self.0 - per_device) as u8,
            }
        }
    }

    pub const fn field_name(self) -> &'static str {
        FIELD_NAMES[self.0]
    }

    /// All logical channels in payload order
    pub fn all() -> impl Iterator<Item = ChannelId> {
        (0..CHANNEL_COUNT).map(ChannelId)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdcError {
    #[error("failed to initialize ADC at address {address:#04x}")]
    Init { address: u8 },

    #[error("failed to read sub-channel {sub_channel} of ADC at {address:#04x}: {reason}")]
    Read {
        address: u8,
        sub_channel: u8,
        reason: String,
    },
}

/// Driver for a single 4-channel converter
pub trait AdcDriver: Debug {
    /// Bring the device up at the given bus address
    fn begin(&mut self, address: u8) -> Result<(), AdcError>;

    /// Perform one blocking single-ended conversion and return the raw count
    fn read_single_ended(&mut self, sub_channel: u8) -> Result<i16, AdcError>;
}

/// Both converters, initialized and ready to sample
#[derive(Debug)]
pub struct AdcBank<D: AdcDriver> {
    device_a: D,
    device_b: D,
}

impl<D: AdcDriver> AdcBank<D> {
    /// Begin device A then device B. Any failure is fatal to the caller, there is no retry.
    pub fn initialize(mut device_a: D, mut device_b: D) -> Result<Self, AdcError> {
        for (device, driver) in [(Device::A, &mut device_a), (Device::B, &mut device_b)] {
            let address = device.address();
            if let Err(err) = driver.begin(address) {
                error!("Failed to initialize ADC {:?} at {:#04x}: {err}", device, address);
                return Err(err);
            }
            info!("ADC {:?} initialized at {:#04x}", device, address);
        }

        Ok(Self { device_a, device_b })
    }

    pub fn read(&mut self, channel: ChannelId) -> Result<i16, AdcError> {
        let PhysicalChannel {
            device,
            sub_channel,
        } = channel.physical();

        match device {
            Device::A => self.device_a.read_single_ended(sub_channel),
            Device::B => self.device_b.read_single_ended(sub_channel),
        }
    }
}
