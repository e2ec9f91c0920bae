//! Tracing subscriber setup
//!
//! Logs go to stdout. `DEBUG_LOGGING=1` (or `debug: true` in the CLI config)
//! raises this workspace's crates to debug level.

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

pub fn init(debug: bool) {
    let debug = debug || std::env::var("DEBUG_LOGGING").is_ok();
    let filter = EnvFilter::new(directive(debug));

    let stdout_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(true)
        .with_span_events(FmtSpan::NONE);

    // try_init: a second call (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(stdout_layer)
        .with(filter)
        .try_init();
}

fn directive(debug: bool) -> &'static str {
    if debug {
        "info,crit_core=debug,crit_cli=debug"
    } else {
        "info"
    }
}
