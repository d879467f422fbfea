use std::io::{self, IsTerminal as _};

use time::{UtcOffset, macros::format_description};
use tracing::Level;
use tracing_subscriber::{FmtSubscriber, fmt::time::OffsetTime};

/// Level selected by `-v` / `-q`, INFO by default.
pub(crate) fn level(verbose: u8, quiet: bool) -> Level {
    match (quiet, verbose) {
        (true, _) => Level::WARN,
        (false, 0) => Level::INFO,
        (false, 1) => Level::DEBUG,
        (false, _) => Level::TRACE,
    }
}

/// Installs the global subscriber writing to stderr.
///
/// Stdout stays free for command output.
pub(crate) fn init_logger(level: Level) -> anyhow::Result<()> {
    // the offset can only be read safely while single-threaded, so do it first
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    let timer = OffsetTime::new(
        offset,
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    );

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_ansi(io::stderr().is_terminal())
        .with_timer(timer)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("failed to install log subscriber: {e}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level() {
        assert_eq!(level(0, false), Level::INFO);
        assert_eq!(level(1, false), Level::DEBUG);
        assert_eq!(level(3, false), Level::TRACE);
        assert_eq!(level(2, true), Level::WARN);
    }
}
