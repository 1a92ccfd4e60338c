// Standard Library Imports
use std::{fs::File, io, path::Path};

// External Crate Imports
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*};

// Public API ==========================================================================================================

/// Maps `-v` counts onto log levels: warn by default, then info, debug, and trace
pub const fn level_filter(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::ERROR;
    }
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Installs the global subscriber, logging to stderr and (optionally) to `log_file` as well
pub fn setup_logging(verbosity: u8, quiet: bool, log_file: Option<&Path>) -> io::Result<()> {
    let stderr_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .compact();

    let subscriber = tracing_subscriber::registry()
        .with(level_filter(verbosity, quiet))
        .with(stderr_layer);

    if let Some(path) = log_file {
        let file_layer = fmt::layer()
            .with_writer(File::create(path)?)
            .with_ansi(false)
            .with_thread_ids(true);
        subscriber.with(file_layer).init();
    } else {
        subscriber.init();
    }

    Ok(())
}

// Module Tests ========================================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_levels() {
        assert_eq!(level_filter(0, false), LevelFilter::WARN);
        assert_eq!(level_filter(1, false), LevelFilter::INFO);
        assert_eq!(level_filter(2, false), LevelFilter::DEBUG);
        assert_eq!(level_filter(3, false), LevelFilter::TRACE);
        assert_eq!(level_filter(u8::MAX, false), LevelFilter::TRACE);
    }

    #[test]
    fn quiet_keeps_errors() {
        assert_eq!(level_filter(0, true), LevelFilter::ERROR);
        assert_eq!(level_filter(3, true), LevelFilter::ERROR);
    }
}
