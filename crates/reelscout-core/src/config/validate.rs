//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.dispatch.parallel == 0 {
            return Err(ConfigError::ValidationError(
                "dispatch.parallel must be > 0".into(),
            ));
        }
        if self.dispatch.max_new_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "dispatch.max_new_tokens must be > 0".into(),
            ));
        }
        if self.gateway.request_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "gateway.request_timeout_ms must be > 0".into(),
            ));
        }
        if self.gateway.batch_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "gateway.batch_timeout_ms must be > 0".into(),
            ));
        }
        if self.scrape.download_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "scrape.download_timeout_ms must be > 0".into(),
            ));
        }
        if self.scrape.post_count == 0 {
            return Err(ConfigError::ValidationError(
                "scrape.post_count must be > 0".into(),
            ));
        }
        if let Some(runtime) = &self.runtime.openai {
            if runtime.fps <= 0.0 {
                return Err(ConfigError::ValidationError(
                    "runtime.openai.fps must be > 0".into(),
                ));
            }
            if runtime.max_video_pixels == 0 {
                return Err(ConfigError::ValidationError(
                    "runtime.openai.max_video_pixels must be > 0".into(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OpenAiCompatConfig;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_zero_parallel_rejected() {
        let mut config = Config::default();
        config.dispatch.parallel = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = Config::default();
        config.gateway.request_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_runtime_fps_rejected() {
        let mut config = Config::default();
        config.runtime.openai = Some(OpenAiCompatConfig {
            fps: 0.0,
            ..OpenAiCompatConfig::default()
        });
        assert!(config.validate().is_err());
    }
}
