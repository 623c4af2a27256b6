use crate::LOG_ENV;
use crate::output::Verbosity;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Filter used when `GCLONE_LOG` is unset or invalid.
#[must_use]
pub const fn default_directive(verbosity: Verbosity) -> &'static str {
    match verbosity {
        Verbosity::Verbose => "gclone=debug",
        Verbosity::Quiet => "error",
        Verbosity::Normal => "warn",
    }
}

/// Installs the global tracing subscriber, writing to stderr.
///
/// `GCLONE_LOG` takes precedence over the verbosity flags. Calling this more
/// than once is harmless; only the first subscriber is installed.
pub fn init(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}
