use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Base log level for the command-line flags. `quiet` wins over `verbose`.
pub fn level_for(verbose: bool, quiet: bool) -> Level {
    if quiet {
        Level::ERROR
    } else if verbose {
        Level::DEBUG
    } else {
        Level::WARN
    }
}

/// Install the global subscriber. Logs go to stderr so stdout stays free
/// for results; `RUST_LOG` directives are layered on top of the base level.
pub fn init(verbose: bool, quiet: bool) {
    let filter = EnvFilter::from_default_env().add_directive(level_for(verbose, quiet).into());

    // A second call (e.g. from tests) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init();
}
