pub mod acquisition;
pub mod adc;
pub mod clock;
pub mod config;
pub mod network;
pub mod payload;
pub mod retry;
pub mod scheduler;
pub mod telemetry_task;
pub mod transmission;
