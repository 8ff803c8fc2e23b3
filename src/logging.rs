//! Log setup for the CLI.
//!
//! All diagnostics go through `tracing`. The filter comes from the
//! `[logging]` config section unless `RUST_LOG` is set:
//!
//! ```bash
//! RUST_LOG=debug quill build
//! RUST_LOG=quill::watch=trace quill build
//! ```
//!
//! User-facing build summaries are not logs; they are printed by
//! [`crate::output`].

use std::sync::Once;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

use crate::config::LoggingConfig;

static INIT: Once = Once::new();

/// Compact time format: HH:MM:SS.mmm
struct CompactTime;

impl FormatTime for CompactTime {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%H:%M:%S%.3f"))
    }
}

/// Install the global subscriber. Only the first call has an effect.
pub fn init(config: &LoggingConfig) {
    INIT.call_once(|| {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            EnvFilter::new(config.filter_directives())
        };

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_timer(CompactTime)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    });
}
