use tracing_subscriber::{fmt, EnvFilter};

const VERBOSE_DIRECTIVES: &str =
    "info,enforcer=debug,enforcer_core=debug,enforcer_client=debug,enforcer_engine=debug,enforcer_daemon=debug";

/// Install the global subscriber. `RUST_LOG` wins over `verbose`.
///
/// Logs go to stderr so command output on stdout stays machine-readable.
/// Calling this twice is harmless; the second call is ignored.
pub fn init_tracing(verbose: bool, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { VERBOSE_DIRECTIVES } else { "info" })
    });

    if json {
        let _ = fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    } else {
        let _ = fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init();
    }
}
