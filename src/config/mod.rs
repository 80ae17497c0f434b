//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

use std::{num::NonZeroU32, str::FromStr};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::application::reading::{
    DEFAULT_SECONDS_PER_CODE_BLOCK, DEFAULT_SECONDS_PER_IMAGE, DEFAULT_WORDS_PER_MINUTE,
    ReadTimeConfig,
};
use crate::application::render::{DEFAULT_THEME, available_themes};
use crate::domain::anchor::AnchorPolicy;

pub use cli::{CliArgs, Command, InputArgs, Overrides, RenderArgs, RenderFormat, TocArgs};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "richdoc";
const ENV_PREFIX: &str = "RICHDOC";

/// Fully validated runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub reading: ReadTimeConfig,
    pub render: RenderSettings,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct RenderSettings {
    pub theme: String,
    pub sanitize_inline_html: bool,
    pub anchors: AnchorPolicy,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_overrides(&cli.overrides);

    Settings::from_raw(raw)
}

pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    reading: RawReadingSettings,
    render: RawRenderSettings,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(theme) = overrides.theme.as_ref() {
            self.render.theme = Some(theme.clone());
        }
        if let Some(sanitize) = overrides.sanitize_inline_html {
            self.render.sanitize_inline_html = Some(sanitize);
        }
        if let Some(anchors) = overrides.anchors.as_ref() {
            self.render.anchors = Some(anchors.clone());
        }
        if let Some(wpm) = overrides.words_per_minute {
            self.reading.words_per_minute = Some(wpm.into());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            logging,
            reading,
            render,
        } = raw;

        Ok(Self {
            logging: build_logging_settings(logging)?,
            reading: build_reading_settings(reading)?,
            render: build_render_settings(render)?,
        })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_reading_settings(reading: RawReadingSettings) -> Result<ReadTimeConfig, LoadError> {
    let words_per_minute = non_zero_u32(
        reading
            .words_per_minute
            .unwrap_or(DEFAULT_WORDS_PER_MINUTE.into()),
        "reading.words_per_minute",
    )?;

    let seconds_per_image = bounded_u32(
        reading
            .seconds_per_image
            .unwrap_or(DEFAULT_SECONDS_PER_IMAGE.into()),
        "reading.seconds_per_image",
    )?;
    let seconds_per_code_block = bounded_u32(
        reading
            .seconds_per_code_block
            .unwrap_or(DEFAULT_SECONDS_PER_CODE_BLOCK.into()),
        "reading.seconds_per_code_block",
    )?;

    Ok(ReadTimeConfig {
        words_per_minute,
        seconds_per_image,
        seconds_per_code_block,
    })
}

fn build_render_settings(render: RawRenderSettings) -> Result<RenderSettings, LoadError> {
    let theme = render
        .theme
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_THEME.to_string());
    let themes = available_themes();
    if !themes.contains(&theme) {
        return Err(LoadError::invalid(
            "render.theme",
            format!("unknown theme `{theme}`; available: {}", themes.join(", ")),
        ));
    }

    let anchors = match render.anchors {
        Some(value) => AnchorPolicy::from_str(&value)
            .map_err(|reason| LoadError::invalid("render.anchors", reason))?,
        None => AnchorPolicy::default(),
    };

    Ok(RenderSettings {
        theme,
        sanitize_inline_html: render.sanitize_inline_html.unwrap_or(false),
        anchors,
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawReadingSettings {
    words_per_minute: Option<u64>,
    seconds_per_image: Option<u64>,
    seconds_per_code_block: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRenderSettings {
    theme: Option<String>,
    sanitize_inline_html: Option<bool>,
    anchors: Option<String>,
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    let value_u32 = bounded_u32(value, key)?;
    NonZeroU32::new(value_u32).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

fn bounded_u32(value: u64, key: &'static str) -> Result<u32, LoadError> {
    value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for u32"))
}

#[cfg(test)]
mod tests;
