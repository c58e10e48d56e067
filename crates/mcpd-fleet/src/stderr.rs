//! Child stderr capture.
//!
//! MCP servers are frequently Python or Node programs whose loggers write
//! `LEVEL[:LOGGER]:MESSAGE` lines to stderr. Those lines are reflected
//! into the daemon's own log at the matching level so one `mcpd` log shows
//! the whole fleet.

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::ChildStderr;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ParsedLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// Parse one stderr line into (level, logger, message).
///
/// `WARNING:root:disk low` → (warn, Some("root"), "disk low").
/// `INFO:starting` → (info, None, "starting").
/// Lines with no recognizable level are reported verbatim at info.
pub(crate) fn parse_line(line: &str) -> (ParsedLevel, Option<&str>, &str) {
    let Some((head, rest)) = line.split_once(':') else {
        return (ParsedLevel::Info, None, line);
    };

    let Some(level) = parse_level(head) else {
        return (ParsedLevel::Info, None, line);
    };

    match rest.split_once(':') {
        Some((logger, message)) if is_logger_name(logger) => (level, Some(logger), message),
        _ => (level, None, rest),
    }
}

fn parse_level(token: &str) -> Option<ParsedLevel> {
    match token.trim().to_ascii_uppercase().as_str() {
        "DEBUG" | "TRACE" => Some(ParsedLevel::Debug),
        "INFO" => Some(ParsedLevel::Info),
        "WARN" | "WARNING" => Some(ParsedLevel::Warn),
        "ERROR" | "FATAL" | "CRITICAL" => Some(ParsedLevel::Error),
        _ => None,
    }
}

/// Logger names look like dotted Python module paths, not free text.
fn is_logger_name(token: &str) -> bool {
    !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-')
}

/// Read the child's stderr until EOF or cancellation, logging each line.
pub(crate) fn spawn_stderr_reader(
    server: String,
    stderr: ChildStderr,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(stderr).lines();
        loop {
            let line = tokio::select! {
                _ = cancel.cancelled() => break,
                line = lines.next_line() => line,
            };
            match line {
                Ok(Some(line)) => log_line(&server, &line),
                Ok(None) => break,
                Err(error) => {
                    tracing::debug!(server = %server, error = %error, "stderr read failed");
                    break;
                }
            }
        }
    })
}

fn log_line(server: &str, line: &str) {
    let (level, logger, message) = parse_line(line);
    let logger = logger.unwrap_or("");
    match level {
        ParsedLevel::Debug => {
            tracing::debug!(server = %server, logger = %logger, "{message}");
        }
        ParsedLevel::Info => {
            tracing::info!(server = %server, logger = %logger, "{message}");
        }
        ParsedLevel::Warn => {
            tracing::warn!(server = %server, logger = %logger, "{message}");
        }
        ParsedLevel::Error => {
            tracing::error!(server = %server, logger = %logger, "{message}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ParsedLevel, parse_line};

    #[test]
    fn parses_level_logger_message() {
        let (level, logger, message) = parse_line("WARNING:root:disk low");
        assert_eq!(level, ParsedLevel::Warn);
        assert_eq!(logger, Some("root"));
        assert_eq!(message, "disk low");
    }

    #[test]
    fn parses_level_without_logger() {
        let (level, logger, message) = parse_line("INFO:starting up");
        assert_eq!(level, ParsedLevel::Info);
        assert_eq!(logger, None);
        assert_eq!(message, "starting up");
    }

    #[test]
    fn critical_and_fatal_map_to_error() {
        assert_eq!(parse_line("CRITICAL:oom").0, ParsedLevel::Error);
        assert_eq!(parse_line("FATAL:panic").0, ParsedLevel::Error);
    }

    #[test]
    fn warning_maps_to_warn() {
        assert_eq!(parse_line("WARNING:deprecated").0, ParsedLevel::Warn);
    }

    #[test]
    fn unparseable_line_is_info_verbatim() {
        let (level, logger, message) = parse_line("Traceback (most recent call last):");
        assert_eq!(level, ParsedLevel::Info);
        assert_eq!(logger, None);
        assert_eq!(message, "Traceback (most recent call last):");
    }

    #[test]
    fn message_with_colons_survives() {
        let (level, logger, message) = parse_line("ERROR:app.db:connect failed: refused");
        assert_eq!(level, ParsedLevel::Error);
        assert_eq!(logger, Some("app.db"));
        assert_eq!(message, "connect failed: refused");
    }

    #[test]
    fn free_text_after_level_is_not_a_logger() {
        let (level, logger, message) = parse_line("INFO:listening on port 8080: ready");
        assert_eq!(level, ParsedLevel::Info);
        assert_eq!(logger, None);
        assert_eq!(message, "listening on port 8080: ready");
    }
}
