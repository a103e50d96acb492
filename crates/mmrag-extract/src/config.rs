//! Extraction settings.

use mmrag_core::ExtractError;
use std::path::PathBuf;

/// Chunking and image output settings for [`PdfExtractor`](crate::PdfExtractor).
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionConfig {
    /// Hard upper bound on chunk length, in characters
    pub max_characters: usize,
    /// Soft bound: once a chunk reaches this length the next element starts a new one
    pub new_after_n_chars: usize,
    /// Sections shorter than this are merged with their successor
    pub combine_text_under_n_chars: usize,
    /// Root directory for extracted figures; each document gets a subdirectory
    pub image_dir: PathBuf,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_characters: 1000,
            new_after_n_chars: 800,
            combine_text_under_n_chars: 500,
            image_dir: PathBuf::from("./resources/figs"),
        }
    }
}

impl ExtractionConfig {
    /// Same settings with different chunk sizes.
    #[must_use]
    pub fn with_chunking(
        mut self,
        max_characters: usize,
        new_after_n_chars: usize,
        combine_text_under_n_chars: usize,
    ) -> Self {
        self.max_characters = max_characters;
        self.new_after_n_chars = new_after_n_chars;
        self.combine_text_under_n_chars = combine_text_under_n_chars;
        self
    }

    /// Same settings with a different image directory.
    #[must_use]
    pub fn with_image_dir(mut self, image_dir: impl Into<PathBuf>) -> Self {
        self.image_dir = image_dir.into();
        self
    }

    pub fn validate(&self) -> Result<(), ExtractError> {
        if self.max_characters == 0
            || self.new_after_n_chars == 0
            || self.combine_text_under_n_chars == 0
        {
            return Err(ExtractError::InvalidConfig(
                "chunk sizes must be greater than zero".to_string(),
            ));
        }
        if self.new_after_n_chars > self.max_characters {
            return Err(ExtractError::InvalidConfig(format!(
                "new_after_n_chars ({}) exceeds max_characters ({})",
                self.new_after_n_chars, self.max_characters
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ExtractionConfig::default();
        assert_eq!(config.max_characters, 1000);
        assert_eq!(config.new_after_n_chars, 800);
        assert_eq!(config.combine_text_under_n_chars, 500);
        assert_eq!(config.image_dir, PathBuf::from("./resources/figs"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero() {
        let config = ExtractionConfig::default().with_chunking(0, 0, 0);
        assert!(matches!(
            config.validate(),
            Err(ExtractError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_validate_rejects_soft_bound_above_hard_bound() {
        let config = ExtractionConfig::default().with_chunking(500, 600, 100);
        assert!(config.validate().is_err());
    }
}
