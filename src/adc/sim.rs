use rand::{random_bool, random_range};

use super::{AdcDriver, AdcError};

/// Odds that a single conversion lands on a negative-going impulse
const IMPULSE_PROBABILITY: f64 = 0.0005;

/// Simulated converter: a noisy positive baseline with rare brief negative excursions
#[derive(Debug, Default)]
pub struct SimAdc {
    address: Option<u8>,
}

impl SimAdc {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AdcDriver for SimAdc {
    fn begin(&mut self, address: u8) -> Result<(), AdcError> {
        tracing::info!("Simulated ADC started at {:#04x}", address);
        self.address = Some(address);
        Ok(())
    }

    fn read_single_ended(&mut self, sub_channel: u8) -> Result<i16, AdcError> {
        let Some(address) = self.address else {
            return Err(AdcError::Read {
                address: 0,
                sub_channel,
                reason: "device not started".to_string(),
            });
        };

        // Spread the baselines a little per input so the channels are tellable apart
        let baseline = 8_000 + i16::from(sub_channel) * 1_000 + i16::from(address & 0x01) * 500;

        if random_bool(IMPULSE_PROBABILITY) {
            let depth: i16 = random_range(100..=4_000);
            Ok(-depth)
        } else {
            let jitter: i16 = random_range(-40..=40);
            Ok(baseline + jitter)
        }
    }
}
