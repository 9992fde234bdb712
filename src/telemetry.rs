//! Log subscriber setup for the binary.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter directive for a verbosity count (`-v` occurrences).
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "info",
        1 => "solar_bill_sim=debug,info",
        _ => "solar_bill_sim=trace,debug",
    }
}

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the verbosity flag. Logs go to stderr so
/// the report on stdout stays clean.
pub fn init_tracing(verbosity: u8, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_raises_level() {
        assert_eq!(default_directive(0), "info");
        assert!(default_directive(1).contains("debug"));
        assert!(default_directive(5).contains("trace"));
    }

    #[test]
    fn directives_parse() {
        for v in 0..3 {
            assert!(EnvFilter::try_new(default_directive(v)).is_ok());
        }
    }
}
