//! Subscriber setup for the scanner's diagnostics.
//!
//! The pipeline crates log through the `log` facade on the hot path and,
//! with the `tracing` feature on, open `tracing` spans around the per-frame
//! entry points. [`init_tracing`] installs one subscriber for both: a
//! `LogTracer` bridge forwards the `log` records so that mark-detection and
//! decode diagnostics land inside the frame spans that produced them.

use tracing_log::LogTracer;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Default directives when `RUST_LOG` is unset: the scanning crates at
/// debug, everything else at info.
const DEFAULT_FILTER: &str =
    "info,deckscan=debug,deckscan_search=debug,deckscan_decode=debug,deckscan_format=debug";

/// Install the frame-span subscriber and the `log` bridge.
///
/// Safe to call more than once; later calls leave the first subscriber in
/// place. `json` switches to flattened JSON lines for log shippers.
pub fn init_tracing(json: bool) {
    // Without the bridge the per-line search/decode output would bypass the
    // subscriber entirely.
    let _ = LogTracer::init();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE);
    let installed = if json {
        builder.json().flatten_event(true).finish().try_init()
    } else {
        builder
            .with_timer(fmt::time::Uptime::default())
            .finish()
            .try_init()
    };
    if installed.is_err() {
        tracing::debug!("a global subscriber was already installed");
    }
}
