use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILTER_ENV: &str = "SEEK_LOG";
const DEFAULT_FILTER: &str = "warn";
const VERBOSE_FILTER: &str = "debug";

/// Filter directive for the subscriber: `SEEK_LOG`, then `RUST_LOG`, then the
/// level implied by `--verbose`.
pub fn filter_directive(verbose: bool) -> String {
    if verbose {
        return VERBOSE_FILTER.to_string();
    }
    [LOG_FILTER_ENV, "RUST_LOG"]
        .iter()
        .filter_map(|key| std::env::var(key).ok())
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_FILTER.to_string())
}

/// Install the stderr subscriber. Safe to call more than once.
pub fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_new(filter_directive(verbose))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_prefers_seek_log_then_rust_log() {
        let _env_lock = crate::test_support::ENV_LOCK.blocking_lock();
        let old_seek = std::env::var(LOG_FILTER_ENV).ok();
        let old_rust = std::env::var("RUST_LOG").ok();

        std::env::remove_var(LOG_FILTER_ENV);
        std::env::remove_var("RUST_LOG");
        assert_eq!(filter_directive(false), "warn");

        std::env::set_var("RUST_LOG", "info");
        assert_eq!(filter_directive(false), "info");

        std::env::set_var(LOG_FILTER_ENV, "seekcoder=trace");
        assert_eq!(filter_directive(false), "seekcoder=trace");
        assert_eq!(filter_directive(true), "debug");

        match old_seek {
            Some(value) => std::env::set_var(LOG_FILTER_ENV, value),
            None => std::env::remove_var(LOG_FILTER_ENV),
        }
        match old_rust {
            Some(value) => std::env::set_var("RUST_LOG", value),
            None => std::env::remove_var("RUST_LOG"),
        }
    }

    #[test]
    fn test_init_tracing_twice_does_not_panic() {
        init_tracing(false);
        init_tracing(true);
    }
}
