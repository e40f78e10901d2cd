//! Tracing bootstrap for host applications and tests.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,simadm=debug";

/// Install the global tracing subscriber with severity gating from the
/// environment.
///
/// Precedence:
/// 1) `RUST_LOG`
/// 2) `SIMADM_LOG`
/// 3) internal default filter
///
/// Safe to call more than once; later calls are no-ops.
pub fn init() {
  let _ = tracing_subscriber::fmt()
    .with_target(true)
    .with_env_filter(filter_from_env())
    .try_init();
}

fn filter_from_env() -> EnvFilter {
  if let Ok(filter) = EnvFilter::try_from_default_env() {
    return filter;
  }

  if let Some(value) = std::env::var("SIMADM_LOG").ok().filter(|v| !v.trim().is_empty()) {
    if let Ok(filter) = EnvFilter::try_new(value) {
      return filter;
    }
  }

  EnvFilter::new(DEFAULT_FILTER)
}
