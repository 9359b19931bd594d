use std::str::FromStr;

use colored::{Color, ColoredString, Colorize};
use log::Level;

/// Environment variable read by [`init_from_env`].
pub const LOG_ENV: &str = "GENUS_LOG";

pub fn base(level: log::LevelFilter) -> fern::Dispatch {
    fern::Dispatch::new().level(level)
}

pub fn stderr(base: fern::Dispatch) -> fern::Dispatch {
    base.format(move |out, message, record| {
        let level = record.level();
        let color = match level {
            Level::Error => Color::Red,
            Level::Warn => Color::Yellow,
            Level::Info => Color::Blue,
            Level::Debug => Color::Magenta,
            Level::Trace => Color::Green,
        };
        out.finish(format_args!(
            "{} [{}] {}",
            ColoredString::from((level.to_string().to_lowercase() + ":").as_str())
                .color(color)
                .to_string(),
            record.target(),
            message
        ))
    })
    .chain(std::io::stderr())
}

/// Parses a level such as `debug` or `WARN`, falling back to `info`.
pub fn level_from_str(s: &str) -> log::LevelFilter {
    log::LevelFilter::from_str(s.trim()).unwrap_or(log::LevelFilter::Info)
}

pub fn level_from_env() -> log::LevelFilter {
    std::env::var(LOG_ENV)
        .map(|s| level_from_str(&s))
        .unwrap_or(log::LevelFilter::Info)
}

/// Installs the stderr logger. Returns an error if a logger is already set.
pub fn init(level: log::LevelFilter) -> Result<(), log::SetLoggerError> {
    stderr(base(level)).apply()
}

pub fn init_from_env() -> Result<(), log::SetLoggerError> {
    init(level_from_env())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_from_str() {
        assert_eq!(level_from_str("debug"), log::LevelFilter::Debug);
        assert_eq!(level_from_str(" WARN "), log::LevelFilter::Warn);
        assert_eq!(level_from_str("off"), log::LevelFilter::Off);
        assert_eq!(level_from_str("loud"), log::LevelFilter::Info);
    }
}
