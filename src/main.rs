use adc_uplink::acquisition::AcquisitionEngine;
use adc_uplink::adc::AdcBank;
use adc_uplink::adc::sim::SimAdc;
use adc_uplink::clock::MonotonicClock;
use adc_uplink::config::{ASSOCIATION_POLL_PERIOD, RETRY_BACKOFF, ServerConfig};
use adc_uplink::network::{ResolverLink, wait_for_association};
use adc_uplink::retry::FixedBackoff;
use adc_uplink::scheduler::CycleScheduler;
use adc_uplink::telemetry_task::run_telemetry_loop;
use adc_uplink::transmission::TransmissionClient;
use adc_uplink::transmission::tcp::TcpTransport;
use anyhow::Context;
use tracing::*;
use tracing_subscriber::FmtSubscriber;

/// Application & Tokio executor entrypoint
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        // all spans/events with a level higher than TRACE (e.g, debug, info, warn, etc.)
        // will be written to stdout.
        .with_max_level(Level::INFO)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("setting default tracing subscriber failed");

    let server = ServerConfig::load()?;

    // Spin until the network is up
    let mut link = ResolverLink::new(&server);
    wait_for_association(&mut link, &mut FixedBackoff::new(ASSOCIATION_POLL_PERIOD)).await;

    // Both converters must come up, there is no degraded mode
    let bank = AdcBank::initialize(SimAdc::new(), SimAdc::new())
        .context("ADC initialization failed, halting")?;

    let scheduler = CycleScheduler::new(
        AcquisitionEngine::new(bank),
        TransmissionClient::new(TcpTransport::new(), server),
        MonotonicClock::new(),
        FixedBackoff::new(RETRY_BACKOFF),
    );

    run_telemetry_loop(scheduler).await;
    Ok(())
}
