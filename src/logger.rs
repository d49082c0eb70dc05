//! Logging initialisation via tracing-subscriber.
//!
//! The outbound LLM call pulls in reqwest, hyper and h2, which are chatty
//! below `warn`. Plain levels are therefore expanded into a filter that keeps
//! those crates at `warn` unless `trace` is asked for, where the full HTTP
//! exchange is wanted alongside the payload dumps.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::error::AppError;

/// Crates held at `warn` under the default directives.
const QUIET_CRATES: &[&str] = &["hyper", "hyper_util", "reqwest", "h2", "rustls"];

/// Install the global subscriber, writing to stderr.
///
/// `level` is a plain level (`"info"`) or a full directive string
/// (`"led_assist=debug,tower_http=info"`). With `prefer_level` (set when the
/// level came from `-v` flags) it wins over `RUST_LOG`; otherwise `RUST_LOG`
/// wins and `level` is the fallback.
pub fn init(level: &str, prefer_level: bool) -> Result<(), AppError> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(level, prefer_level, rust_log.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| AppError::Logger(format!("failed to set subscriber: {e}")))?;

    Ok(())
}

/// Choose between `level` and a `RUST_LOG` value and parse the winner.
///
/// An unparsable first choice falls back to the other source; only when both
/// fail is an error returned.
fn build_filter(level: &str, prefer_level: bool, rust_log: Option<&str>) -> Result<EnvFilter, AppError> {
    let from_level = || EnvFilter::try_new(default_directives(level));
    let from_env = || match rust_log {
        Some(s) if !s.trim().is_empty() => EnvFilter::try_new(s).map(Some),
        _ => Ok(None),
    };

    if prefer_level {
        match from_level() {
            Ok(filter) => Ok(filter),
            Err(level_err) => match from_env() {
                Ok(Some(filter)) => Ok(filter),
                Ok(None) => Err(AppError::Logger(format!("invalid log level '{level}': {level_err}"))),
                Err(env_err) => Err(AppError::Logger(format!(
                    "invalid log level '{level}': {level_err}; RUST_LOG parse failed: {env_err}"
                ))),
            },
        }
    } else {
        match from_env() {
            Ok(Some(filter)) => Ok(filter),
            _ => from_level().map_err(|e| AppError::Logger(format!("invalid log level '{level}': {e}"))),
        }
    }
}

/// Expand a plain level into directives that quiet the HTTP client stack.
///
/// Directive strings (anything with `=` or `,`) and `trace` pass through as-is.
fn default_directives(level: &str) -> String {
    let plain = level.trim();
    if plain.contains(['=', ',']) || plain.eq_ignore_ascii_case("trace") {
        return plain.to_string();
    }
    let mut out = plain.to_string();
    for krate in QUIET_CRATES {
        out.push_str(&format!(",{krate}=warn"));
    }
    out
}

/// Parse a plain log level string into a [`LevelFilter`].
///
/// Config loading calls this to reject typos like `"verbose"` before the
/// subscriber exists.
pub fn parse_level(level: &str) -> Result<LevelFilter, AppError> {
    if level.is_empty() {
        return Err(AppError::Logger("log level must not be empty".into()));
    }
    level
        .parse::<LevelFilter>()
        .map_err(|_| AppError::Logger(format!("unrecognised log level: '{level}'")))
}
