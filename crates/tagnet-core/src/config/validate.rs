//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.image.width == 0 || self.image.height == 0 {
            return Err(ConfigError::ValidationError(
                "image.width and image.height must be > 0".into(),
            ));
        }
        if !matches!(self.image.channels, 1 | 3 | 4) {
            return Err(ConfigError::ValidationError(format!(
                "image.channels must be 1, 3 or 4 (got {})",
                self.image.channels
            )));
        }
        if self.image.extensions.is_empty() {
            return Err(ConfigError::ValidationError(
                "image.extensions must list at least one extension".into(),
            ));
        }
        if self.labels.id_column.is_empty() {
            return Err(ConfigError::ValidationError(
                "labels.id_column must not be empty".into(),
            ));
        }
        if self.labels.column_prefix.is_empty() {
            return Err(ConfigError::ValidationError(
                "labels.column_prefix must not be empty".into(),
            ));
        }
        if self.loading.parallel_workers == 0 {
            return Err(ConfigError::ValidationError(
                "loading.parallel_workers must be > 0".into(),
            ));
        }
        if self.limits.max_file_size_mb == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_file_size_mb must be > 0".into(),
            ));
        }
        if self.limits.max_image_dimension == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_image_dimension must be > 0".into(),
            ));
        }
        if self.limits.decode_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.decode_timeout_ms must be > 0".into(),
            ));
        }
        if self.training.epochs == 0 {
            return Err(ConfigError::ValidationError(
                "training.epochs must be > 0".into(),
            ));
        }
        if self.model.pool_size == 0
            || self.image.width as usize % self.model.pool_size != 0
            || self.image.height as usize % self.model.pool_size != 0
        {
            return Err(ConfigError::ValidationError(format!(
                "model.pool_size must be > 0 and divide {}x{}",
                self.image.width, self.image.height
            )));
        }
        if self.model.batch_size == 0 {
            return Err(ConfigError::ValidationError(
                "model.batch_size must be > 0".into(),
            ));
        }
        if self.model.learning_rate.is_nan() || self.model.learning_rate <= 0.0 {
            return Err(ConfigError::ValidationError(
                "model.learning_rate must be > 0".into(),
            ));
        }
        Ok(())
    }
}
