use tokio::task;
use tracing::*;

use crate::{
    adc::AdcDriver, clock::Clock, retry::RetryPolicy, scheduler::CycleScheduler,
    transmission::Transport,
};

/// Poll the cycle scheduler forever, as fast as the runtime lets us.
///
/// There is no tick period: sampling rate is bounded only by the ADC bus, which maximizes the
/// chance of catching short negative-going impulses.
pub async fn run_telemetry_loop<D, T, C, R>(mut scheduler: CycleScheduler<D, T, C, R>)
where
    D: AdcDriver,
    T: Transport,
    C: Clock,
    R: RetryPolicy,
{
    info!("Running telemetry loop");

    loop {
        scheduler.tick().await;

        // Let the runtime drive I/O and timers between ticks
        task::yield_now().await;
    }
}
