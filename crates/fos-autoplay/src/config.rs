//! Autoplay Configuration

use crate::AutoplayError;

/// Intersection ratio at which a video counts as visible
pub const DEFAULT_THRESHOLD: f32 = 0.7;

/// Autoplay controller options
#[derive(Debug, Clone)]
pub struct AutoplayConfig {
    /// Visible when at least this fraction of the element is in the viewport
    pub threshold: f32,

    /// Pixels added around the viewport before intersecting
    pub root_margin: f32,

    /// Tag name of the managed elements
    pub media_tag: String,

    /// Scan once per mutation batch instead of once per record
    pub coalesce_mutations: bool,
}

impl Default for AutoplayConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            root_margin: 0.0,
            media_tag: "video".to_string(),
            coalesce_mutations: true,
        }
    }
}

impl AutoplayConfig {
    /// Reject option values the tracker cannot work with
    pub fn validate(&self) -> Result<(), AutoplayError> {
        if !(self.threshold > 0.0 && self.threshold <= 1.0) {
            return Err(AutoplayError::InvalidThreshold(self.threshold));
        }
        if !self.root_margin.is_finite() || self.root_margin < 0.0 {
            return Err(AutoplayError::InvalidRootMargin(self.root_margin));
        }
        if self.media_tag.trim().is_empty() {
            return Err(AutoplayError::EmptyMediaTag);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = AutoplayConfig::default();
        assert_eq!(config.threshold, 0.7);
        assert_eq!(config.root_margin, 0.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_values() {
        for threshold in [0.0, -0.5, 1.5, f32::NAN] {
            let config = AutoplayConfig {
                threshold,
                ..Default::default()
            };
            assert!(matches!(config.validate(), Err(AutoplayError::InvalidThreshold(_))));
        }

        let config = AutoplayConfig {
            root_margin: -1.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(AutoplayError::InvalidRootMargin(_))));

        let config = AutoplayConfig {
            media_tag: " ".into(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(AutoplayError::EmptyMediaTag)));
    }
}
