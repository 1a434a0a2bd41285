use serde::Serialize;

use crate::{
    acquisition::MinHoldRegister,
    adc::{CHANNEL_COUNT, ChannelId},
    config::ADC_LSB_MILLIVOLTS,
};

/// Aggregated window minima in millivolts, one field per logical channel
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct Payload {
    pub x1: f64,
    pub x2: f64,
    pub y1: f64,
    pub y2: f64,
    pub d1: f64,
    pub d2: f64,
    pub z1: f64,
    pub z2: f64,
}

/// Convert a held raw count to millivolts, 0.0 when nothing was sampled
pub fn to_millivolts(minimum: Option<i16>) -> f64 {
    match minimum {
        // Widen before abs so i16::MIN cannot overflow
        Some(raw) => f64::from(i32::from(raw).unsigned_abs()) * ADC_LSB_MILLIVOLTS,
        None => 0.0,
    }
}

impl Payload {
    pub fn from_register(register: &MinHoldRegister) -> Self {
        let mut volts = [0.0; CHANNEL_COUNT];
        for channel in ChannelId::all() {
            volts[channel.index()] = to_millivolts(register.minimum(channel));
        }

        let [x1, x2, y1, y2, d1, d2, z1, z2] = volts;
        Self {
            x1,
            x2,
            y1,
            y2,
            d1,
            d2,
            z1,
            z2,
        }
    }

    /// Field name and value pairs in wire order
    pub fn fields(&self) -> [(&'static str, f64); CHANNEL_COUNT] {
        let values = [
            self.x1, self.x2, self.y1, self.y2, self.d1, self.d2, self.z1, self.z2,
        ];
        let mut fields = [("", 0.0); CHANNEL_COUNT];
        for (channel, value) in ChannelId::all().zip(values) {
            fields[channel.index()] = (channel.field_name(), value);
        }
        fields
    }

    /// `X1=<v>&X2=<v>&...&Z2=<v>` using the shortest decimal form of each value
    pub fn to_form_body(&self) -> String {
        self.fields()
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl From<&MinHoldRegister> for Payload {
    fn from(register: &MinHoldRegister) -> Self {
        Self::from_register(register)
    }
}
