//! Configuration validation with range checks.

use crate::error::ConfigError;
use crate::output::OutputFormat;

use super::Config;

const LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];
const LOG_FORMATS: &[&str] = &["pretty", "json"];

fn require(ok: bool, message: &str) -> Result<(), ConfigError> {
    if ok {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(message.into()))
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        require(
            self.processing.parallel_workers > 0,
            "processing.parallel_workers must be > 0",
        )?;
        require(
            !self.processing.supported_formats.is_empty(),
            "processing.supported_formats must not be empty",
        )?;
        require(
            self.pipeline.buffer_size > 0,
            "pipeline.buffer_size must be > 0",
        )?;
        require(
            self.limits.max_file_size_mb > 0,
            "limits.max_file_size_mb must be > 0",
        )?;
        require(
            self.limits.max_image_dimension > 0,
            "limits.max_image_dimension must be > 0",
        )?;
        require(
            self.limits.decode_timeout_ms > 0,
            "limits.decode_timeout_ms must be > 0",
        )?;
        require(
            OutputFormat::parse(&self.output.format).is_some(),
            "output.format must be one of: json, jsonl, text",
        )?;
        require(
            LOG_LEVELS.contains(&self.logging.level.as_str()),
            "logging.level must be one of: error, warn, info, debug, trace",
        )?;
        require(
            LOG_FORMATS.contains(&self.logging.format.as_str()),
            "logging.format must be one of: pretty, json",
        )
    }
}
