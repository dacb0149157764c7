use colog::format::CologStyle;
use env_logger::Builder;
use log::{Level, LevelFilter};

struct CustomLevelTokens;

impl CologStyle for CustomLevelTokens {
    fn level_token(&self, level: &Level) -> &str {
        match *level {
            Level::Error => "ERR",
            Level::Warn => "WRN",
            Level::Info => "INF",
            Level::Debug => "DBG",
            Level::Trace => "TRC",
        }
    }
}

pub struct Logger;

impl Logger {
    pub fn init(level: Option<LevelFilter>) {
        Builder::new()
            .filter(Some("contextbot"), level.unwrap_or(LevelFilter::Info))
            .filter(Some("rig"), LevelFilter::Warn)
            .filter(Some("reqwest"), LevelFilter::Warn)
            .filter(Some("hyper"), LevelFilter::Warn)
            .filter(Some("qdrant_client"), LevelFilter::Warn)
            .target(env_logger::Target::Stderr)
            .format(colog::formatter(CustomLevelTokens))
            .write_style(env_logger::WriteStyle::Auto)
            .parse_env("CONTEXTBOT_LOG")
            .init();
    }
}
