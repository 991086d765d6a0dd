use anyhow::Result;
use fern::colors::{Color, ColoredLevelConfig};
use log::LevelFilter;
use std::str::FromStr;

use crate::constants::PROJECT_NAME;

pub fn setup_logger(level: &str) -> Result<()> {
    let colors = ColoredLevelConfig {
        trace: Color::Cyan,
        debug: Color::Magenta,
        info: Color::Green,
        warn: Color::Yellow,
        error: Color::BrightRed,
        ..ColoredLevelConfig::new()
    };

    let crate_level = LevelFilter::from_str(level).unwrap_or(LevelFilter::Info);

    fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{}[{}] {}",
                chrono::Local::now().format("[%H:%M:%S]"),
                colors.color(record.level()),
                message
            ))
        })
        .chain(std::io::stdout())
        .level(LevelFilter::Error)
        .level_for(PROJECT_NAME, crate_level)
        .apply()?;

    Ok(())
}
