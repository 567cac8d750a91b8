//! Installs a `tracing` subscriber for the kernel's instrumentation.
//!
//! The kernel itself only emits spans/events when built with its own
//! `tracing` feature (default-off) — owning a subscriber is left to the
//! embedding binary, which is this module's entire job.

#[cfg(feature = "tracing")]
pub fn init() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[cfg(not(feature = "tracing"))]
pub fn init() {}
