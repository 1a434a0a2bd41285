use tokio::time::Duration;
use tracing::*;

use crate::{
    acquisition::{AcquisitionEngine, MinHoldRegister},
    adc::AdcDriver,
    clock::Clock,
    config::{MEASURING_WINDOW, SETTLE_WINDOW},
    payload::Payload,
    retry::RetryPolicy,
    transmission::{Delivery, TransmissionClient, Transport},
};

/// Where the acquisition/transmission cycle currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePhase {
    /// Sampling every tick, folding readings into the min-hold register
    Measuring,
    /// Deliberate pause before sending, nothing is sampled
    Settling,
    /// Sending the held minima until a send succeeds
    Transmitting,
}

/// What a single tick did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickAction {
    Sampled,
    Settling,
    Delivered(Delivery),
    Retrying { attempt: u32 },
}

/// Owns the phase state and drives acquisition and transmission from one polled loop.
///
/// Only one of sampling or sending happens per tick, so the register never has a second
/// mutator while it is being serialized.
#[derive(Debug)]
pub struct CycleScheduler<D, T, C, R>
where
    D: AdcDriver,
    T: Transport,
    C: Clock,
    R: RetryPolicy,
{
    engine: AcquisitionEngine<D>,
    client: TransmissionClient<T>,
    clock: C,
    retry: R,
    phase: CyclePhase,
    phase_started: Duration,
    failed_attempts: u32,
}

impl<D, T, C, R> CycleScheduler<D, T, C, R>
where
    D: AdcDriver,
    T: Transport,
    C: Clock,
    R: RetryPolicy,
{
    /// Starts in [`CyclePhase::Measuring`] with an empty register, phase clock started now
    pub fn new(
        engine: AcquisitionEngine<D>,
        client: TransmissionClient<T>,
        clock: C,
        retry: R,
    ) -> Self {
        let phase_started = clock.now();
        info!("Measuring for {:?}", MEASURING_WINDOW);

        Self {
            engine,
            client,
            clock,
            retry,
            phase: CyclePhase::Measuring,
            phase_started,
            failed_attempts: 0,
        }
    }

    pub async fn tick(&mut self) -> TickAction {
        let now = self.clock.now();
        let elapsed = self.clock.elapsed_since(self.phase_started);

        match self.phase {
            CyclePhase::Measuring => {
                if elapsed < MEASURING_WINDOW {
                    self.engine.sample();
                    return TickAction::Sampled;
                }

                // The register is kept as-is until a send succeeds
                self.phase = CyclePhase::Settling;
                self.phase_started = now;
                info!(
                    "Measuring window closed ({} failed reads), settling for {:?}",
                    self.engine.failed_reads(),
                    SETTLE_WINDOW
                );
                TickAction::Settling
            }
            CyclePhase::Settling => {
                if elapsed < SETTLE_WINDOW {
                    return TickAction::Settling;
                }

                self.phase = CyclePhase::Transmitting;
                info!("Settle window over, transmitting");
                self.transmit(now).await
            }
            CyclePhase::Transmitting => self.transmit(now).await,
        }
    }

    async fn transmit(&mut self, now: Duration) -> TickAction {
        let payload = self.payload();
        match serde_json::to_string(&payload) {
            Ok(json) => debug!("Sending payload: {json}"),
            Err(err) => warn!("Unable to render payload as JSON: {err}"),
        }

        match self.client.send_payload(&payload).await {
            Ok(delivery) => {
                self.engine.reset();
                self.failed_attempts = 0;
                self.phase = CyclePhase::Measuring;
                self.phase_started = now;
                info!("Payload delivered, measuring for {:?}", MEASURING_WINDOW);
                TickAction::Delivered(delivery)
            }
            Err(err) => {
                self.failed_attempts = self.failed_attempts.saturating_add(1);
                let attempt = self.failed_attempts;
                warn!("{err}, retrying (attempt {attempt} failed)");
                self.retry.backoff(attempt).await;
                TickAction::Retrying { attempt }
            }
        }
    }

    pub fn phase(&self) -> CyclePhase {
        self.phase
    }

    /// Clock reading at which the current phase (or settle, while transmitting) began
    pub fn phase_started(&self) -> Duration {
        self.phase_started
    }

    pub fn register(&self) -> &MinHoldRegister {
        self.engine.register()
    }

    /// Payload as it would be sent right now
    pub fn payload(&self) -> Payload {
        Payload::from_register(self.engine.register())
    }

    /// ADC reads skipped in the current window
    pub fn failed_reads(&self) -> u32 {
        self.engine.failed_reads()
    }

    /// Consecutive failed sends of the current payload
    pub fn failed_attempts(&self) -> u32 {
        self.failed_attempts
    }
}
