//! Tracing setup shared by the binaries.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing with BURGER_LOG and LOG_FORMAT support.
///
/// `RUST_LOG` takes precedence when set. Otherwise `BURGER_LOG`
/// (`debug`, `info`, `warn`, `error`; default `info`) sets the level for this
/// crate and its binaries only. `LOG_FORMAT=json` switches to JSON lines. Output goes to stderr.
pub fn init_tracing() {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(default_directive(std::env::var("BURGER_LOG").ok().as_deref()))
    };

    let use_json = std::env::var("LOG_FORMAT").as_deref() == Ok("json");

    if use_json {
        let subscriber = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr));
        let _ = subscriber.try_init();
    } else {
        let subscriber = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr));
        let _ = subscriber.try_init();
    }
}

fn default_directive(level: Option<&str>) -> String {
    let level = match level {
        Some("trace") => "trace",
        Some("debug") => "debug",
        Some("warn") | Some("warning") => "warn",
        Some("error") => "error",
        _ => "info",
    };
    format!("burger_shop={level},burger_server={level},burger_client={level}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_defaults_to_info() {
        assert_eq!(
            default_directive(None),
            "burger_shop=info,burger_server=info,burger_client=info"
        );
        assert_eq!(default_directive(Some("verbose")), default_directive(None));
    }

    #[test]
    fn warning_is_an_alias_for_warn() {
        assert_eq!(default_directive(Some("warning")), default_directive(Some("warn")));
        assert!(default_directive(Some("debug")).starts_with("burger_shop=debug,"));
    }
}
