//! Editor configuration
//!
//! Settings that shape newly created annotations and the undo history. The
//! configuration can be created programmatically, deserialized (every field
//! has a default), or loaded from environment variables.

use serde::{Deserialize, Serialize};

/// Font metric used to size text-bearing annotations.
///
/// Widths are estimated from an average character width rather than real
/// glyph metrics, which is enough to keep text inside its box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextMetrics {
    /// Font size in points
    pub font_size: f32,
    /// Average character width relative to the font size
    pub char_width_ratio: f32,
    /// Extra vertical space added to a single text line (points)
    pub line_spacing: f32,
}

impl Default for TextMetrics {
    fn default() -> Self {
        Self { font_size: 16.0, char_width_ratio: 0.6, line_spacing: 4.0 }
    }
}

impl TextMetrics {
    /// Estimated width of `text` on one line, in points.
    pub fn text_width(&self, text: &str) -> f32 {
        text.chars().count() as f32 * self.font_size * self.char_width_ratio
    }

    /// Height of one line of text including spacing.
    pub fn line_height(&self) -> f32 {
        self.font_size + self.line_spacing
    }
}

/// Configuration for a [`crate::CommandWrapper`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Maximum number of undo entries; `None` keeps unlimited history
    pub history_limit: Option<usize>,
    /// Metric for sizing text in new annotations
    pub text: TextMetrics,
    /// Border width of new box and ellipse annotations (a twelfth of an inch)
    pub border_width: f32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self { history_limit: None, text: TextMetrics::default(), border_width: 72.0 / 12.0 }
    }
}

impl EditorConfig {
    /// Limit the undo history to `limit` entries.
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = Some(limit);
        self
    }

    /// Sets the font size used for new text.
    pub fn with_font_size(mut self, font_size: f32) -> Self {
        self.text.font_size = font_size;
        self
    }

    /// Loads configuration from environment variables.
    ///
    /// Environment variables:
    /// - `AIRMARK_HISTORY_LIMIT`: maximum undo entries (default: unlimited)
    /// - `AIRMARK_FONT_SIZE`: font size in points for new text (default: 16)
    ///
    /// # Errors
    /// Returns an error if any environment variable contains an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`EditorConfig::from_env`] with an injectable variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::default().overlay_lookup(lookup)
    }

    /// Applies any environment variables on top of `self`.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.overlay_lookup(|key| std::env::var(key).ok())
    }

    fn overlay_lookup<F>(self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = self;

        if let Some(val) = lookup("AIRMARK_HISTORY_LIMIT") {
            let limit = val
                .trim()
                .parse::<usize>()
                .map_err(|_| ConfigError::InvalidValue("AIRMARK_HISTORY_LIMIT".to_string()))?;
            config.history_limit = Some(limit);
        }

        if let Some(val) = lookup("AIRMARK_FONT_SIZE") {
            let size = val
                .trim()
                .parse::<f32>()
                .ok()
                .filter(|size| size.is_finite() && *size > 0.0)
                .ok_or_else(|| ConfigError::InvalidValue("AIRMARK_FONT_SIZE".to_string()))?;
            config.text.font_size = size;
        }

        Ok(config)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {0}")]
    InvalidValue(String),
}
