//! Tracing subscriber setup untuk binary dan test.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Default filter kalau `RUST_LOG` tidak di-set
const DEFAULT_FILTER: &str = "ringlat=info";

/// Initialize tracing subscriber dengan timestamps dan nama thread.
///
/// Aman dipanggil lebih dari sekali; panggilan berikutnya diabaikan.
pub fn init_tracing() {
    init_tracing_with(DEFAULT_FILTER);
}

/// Sama dengan [`init_tracing`], dengan default filter sendiri.
pub fn init_tracing_with(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_thread_names(true)
                .with_file(false)
                .with_line_number(false)
                .with_timer(fmt::time::uptime()),
        )
        .with(filter)
        .try_init();
}
