#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use adc_uplink::acquisition::AcquisitionEngine;
use adc_uplink::adc::{AdcBank, AdcDriver, AdcError};
use adc_uplink::clock::Clock;
use adc_uplink::config::ServerConfig;
use adc_uplink::retry::RetryPolicy;
use adc_uplink::scheduler::CycleScheduler;
use adc_uplink::transmission::{TransmissionClient, Transport, TransportError};
use tokio::time::Duration;

/// Clock that only moves when told to
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    millis: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn set(&self, millis: u64) {
        self.millis.store(millis, Ordering::SeqCst);
    }

    pub fn advance(&self, millis: u64) {
        self.millis.fetch_add(millis, Ordering::SeqCst);
    }

    pub fn millis(&self) -> u64 {
        self.millis.load(Ordering::SeqCst)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_millis(self.millis())
    }
}

#[derive(Debug, Default)]
struct AdcScript {
    queued: [VecDeque<i16>; 4],
    always_fail: [bool; 4],
    fallback: i16,
    reads: Vec<u64>,
}

/// Converter whose readings are queued per sub-channel by the test
#[derive(Debug, Clone)]
pub struct ScriptedAdc {
    clock: ManualClock,
    script: Arc<Mutex<AdcScript>>,
}

impl ScriptedAdc {
    pub fn new(clock: &ManualClock, fallback: i16) -> Self {
        Self {
            clock: clock.clone(),
            script: Arc::new(Mutex::new(AdcScript {
                fallback,
                ..Default::default()
            })),
        }
    }

    pub fn queue(&self, sub_channel: u8, readings: &[i16]) {
        let mut script = self.script.lock().unwrap();
        script.queued[sub_channel as usize].extend(readings.iter().copied());
    }

    pub fn fail_always(&self, sub_channel: u8) {
        self.script.lock().unwrap().always_fail[sub_channel as usize] = true;
    }

    /// Clock readings (ms) at which a conversion was performed
    pub fn read_times(&self) -> Vec<u64> {
        self.script.lock().unwrap().reads.clone()
    }
}

impl AdcDriver for ScriptedAdc {
    fn begin(&mut self, _address: u8) -> Result<(), AdcError> {
        Ok(())
    }

    fn read_single_ended(&mut self, sub_channel: u8) -> Result<i16, AdcError> {
        let mut script = self.script.lock().unwrap();
        script.reads.push(self.clock.millis());

        if script.always_fail[sub_channel as usize] {
            return Err(AdcError::Read {
                address: 0,
                sub_channel,
                reason: "scripted failure".to_string(),
            });
        }

        let fallback = script.fallback;
        Ok(script.queued[sub_channel as usize]
            .pop_front()
            .unwrap_or(fallback))
    }
}

#[derive(Debug, Default)]
struct Wire {
    connect_ok: VecDeque<bool>,
    write_ok: VecDeque<bool>,
    response: Vec<String>,
    pending: VecDeque<String>,
    connected: bool,
    connects: usize,
    closes: usize,
    requests: Vec<String>,
}

/// Transport that records every request and answers with a canned response
#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    wire: Arc<Mutex<Wire>>,
}

impl RecordingTransport {
    pub fn new(response: &[&str]) -> Self {
        let transport = Self::default();
        transport.wire.lock().unwrap().response = response.iter().map(|l| l.to_string()).collect();
        transport
    }

    /// Outcome of upcoming connect attempts, later attempts succeed
    pub fn script_connects(&self, outcomes: &[bool]) {
        self.wire.lock().unwrap().connect_ok.extend(outcomes);
    }

    /// Outcome of upcoming writes, later writes succeed
    pub fn script_writes(&self, outcomes: &[bool]) {
        self.wire.lock().unwrap().write_ok.extend(outcomes);
    }

    /// Every request written, including those whose write failed
    pub fn requests(&self) -> Vec<String> {
        self.wire.lock().unwrap().requests.clone()
    }

    pub fn connects(&self) -> usize {
        self.wire.lock().unwrap().connects
    }

    pub fn closes(&self) -> usize {
        self.wire.lock().unwrap().closes
    }

    pub fn is_connected(&self) -> bool {
        self.wire.lock().unwrap().connected
    }
}

#[async_trait::async_trait]
impl Transport for RecordingTransport {
    async fn connect(&mut self, _host: &str, _port: u16) -> Result<(), TransportError> {
        let mut wire = self.wire.lock().unwrap();
        wire.connects += 1;
        if !wire.connect_ok.pop_front().unwrap_or(true) {
            return Err(TransportError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "scripted refusal",
            )));
        }
        wire.connected = true;
        let pending = wire.response.iter().cloned().collect();
        wire.pending = pending;
        Ok(())
    }

    async fn write_all(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let mut wire = self.wire.lock().unwrap();
        if !wire.connected {
            return Err(TransportError::NotConnected);
        }
        wire.requests.push(String::from_utf8_lossy(bytes).into_owned());
        if !wire.write_ok.pop_front().unwrap_or(true) {
            return Err(TransportError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "scripted reset",
            )));
        }
        Ok(())
    }

    async fn read_line(&mut self) -> Result<Option<String>, TransportError> {
        let mut wire = self.wire.lock().unwrap();
        if !wire.connected {
            return Err(TransportError::NotConnected);
        }
        Ok(wire.pending.pop_front())
    }

    async fn close(&mut self) {
        let mut wire = self.wire.lock().unwrap();
        wire.connected = false;
        wire.closes += 1;
    }
}

/// Retry policy that never sleeps, only counts
#[derive(Debug, Clone, Default)]
pub struct NoBackoff {
    attempts: Arc<Mutex<Vec<u32>>>,
}

impl NoBackoff {
    pub fn attempts(&self) -> Vec<u32> {
        self.attempts.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl RetryPolicy for NoBackoff {
    async fn backoff(&mut self, attempt: u32) {
        self.attempts.lock().unwrap().push(attempt);
    }
}

pub const OK_RESPONSE: &[&str] = &[
    "HTTP/1.1 200 OK",
    "Content-Type: text/html",
    "",
    "New record created successfully",
];

pub type TestScheduler = CycleScheduler<ScriptedAdc, RecordingTransport, ManualClock, NoBackoff>;

/// Everything a cycle test needs to steer and observe the scheduler
pub struct Rig {
    pub clock: ManualClock,
    pub adc_a: ScriptedAdc,
    pub adc_b: ScriptedAdc,
    pub transport: RecordingTransport,
    pub retry: NoBackoff,
    pub scheduler: TestScheduler,
}

impl Rig {
    pub fn new() -> Self {
        Self::with_response(OK_RESPONSE)
    }

    pub fn with_response(response: &[&str]) -> Self {
        let clock = ManualClock::default();
        let adc_a = ScriptedAdc::new(&clock, 1_000);
        let adc_b = ScriptedAdc::new(&clock, 1_000);
        let transport = RecordingTransport::new(response);
        let retry = NoBackoff::default();

        let bank = AdcBank::initialize(adc_a.clone(), adc_b.clone()).unwrap();
        let scheduler = CycleScheduler::new(
            AcquisitionEngine::new(bank),
            TransmissionClient::new(transport.clone(), ServerConfig::default()),
            clock.clone(),
            retry.clone(),
        );

        Self {
            clock,
            adc_a,
            adc_b,
            transport,
            retry,
            scheduler,
        }
    }

    /// Total conversions across both devices
    pub fn reads(&self) -> usize {
        self.adc_a.read_times().len() + self.adc_b.read_times().len()
    }

    pub fn read_times(&self) -> Vec<u64> {
        let mut times = self.adc_a.read_times();
        times.extend(self.adc_b.read_times());
        times.sort_unstable();
        times
    }
}

/// Body of a recorded request, everything after the blank line
pub fn body_of(request: &str) -> &str {
    request
        .split_once("\r\n\r\n")
        .map(|(_, body)| body)
        .unwrap_or("")
}
