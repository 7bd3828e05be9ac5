//! Tracing setup for the console client.
//!
//! - LOG_LEVEL is an `EnvFilter` directive string ("debug", "warn,session=trace", ...).
//! - LOG_FORMAT picks "pretty" (default) or "json".
//!
//! Everything is written to stderr; stdout is the render surface.

use tracing_subscriber::EnvFilter;

/// Used when LOG_LEVEL is unset or unparsable.
pub const DEFAULT_FILTER: &str = "info,session=debug,auditor_client=debug";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    /// Anything other than "json" (case-insensitive) means pretty.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

/// Install the global subscriber. A second call is a no-op.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let format = LogFormat::parse(std::env::var("LOG_FORMAT").ok().as_deref());

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true);

    let installed = match format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.try_init(),
    };
    if installed.is_ok() {
        tracing::debug!(target: "auditor_client", ?format, "Tracing initialised");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_format_defaults_to_pretty() {
        assert_eq!(LogFormat::parse(None), LogFormat::Pretty);
        assert_eq!(LogFormat::parse(Some("JSON ")), LogFormat::Json);
        assert_eq!(LogFormat::parse(Some("compact")), LogFormat::Pretty);
    }

    #[test]
    fn init_twice_is_harmless() {
        init_tracing();
        init_tracing();
    }
}
