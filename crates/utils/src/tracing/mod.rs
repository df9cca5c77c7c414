use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// Re-export tracing macros for convenience
pub use tracing::{debug, error, info, instrument, span, trace, warn, Level, Span};

/// Default filter when `RUST_LOG` is unset or unparsable
const DEFAULT_FILTER: &str = "info";

/// Initialize the tracing system
///
/// Reads the filter from `RUST_LOG`, falling back to `info`. Output goes to
/// stderr in the compact format, with ANSI colours only when stderr is a TTY.
pub fn init() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))?;

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(is_tty())
        .compact()
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

/// Check if we're running in a TTY environment
fn is_tty() -> bool {
    std::io::IsTerminal::is_terminal(&std::io::stderr())
}

/// Create a span covering one precache job
pub fn job_span(root: &std::path::Path) -> Span {
    span!(Level::INFO, "job", root = %root.display())
}
