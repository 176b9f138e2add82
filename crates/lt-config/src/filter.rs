//! Channel selection.

use regex::Regex;

use crate::config::ConvertConfig;
use crate::validate::ValidationError;

/// Compiled include/ignore patterns for channel names.
///
/// The include pattern only has to match at the start of the name; the
/// ignore pattern has to match the whole name. Ignores take precedence.
#[derive(Debug, Clone)]
pub struct ChannelFilter {
    include: Regex,
    ignore: Option<Regex>,
}

impl ChannelFilter {
    pub fn new(include: &str, ignore: Option<&str>) -> Result<Self, ValidationError> {
        let include = Regex::new(&format!("^(?:{})", include)).map_err(|e| {
            ValidationError::InvalidPattern {
                field: "channels",
                reason: e.to_string(),
            }
        })?;
        let ignore = ignore
            .map(|pat| {
                Regex::new(&format!("^(?:{})$", pat)).map_err(|e| ValidationError::InvalidPattern {
                    field: "ignore",
                    reason: e.to_string(),
                })
            })
            .transpose()?;

        Ok(Self { include, ignore })
    }

    pub fn from_config(config: &ConvertConfig) -> Result<Self, ValidationError> {
        Self::new(&config.channels, config.ignore.as_deref())
    }

    pub fn accepts(&self, channel: &str) -> bool {
        if let Some(ignore) = &self.ignore {
            if ignore.is_match(channel) {
                return false;
            }
        }
        self.include.is_match(channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn include_is_anchored_at_start_only() {
        let f = ChannelFilter::new("POSE", None).unwrap();
        assert!(f.accepts("POSE"));
        assert!(f.accepts("POSE_BODY"));
        assert!(!f.accepts("BODY_POSE"));
    }

    #[test]
    fn ignore_must_match_whole_name() {
        let f = ChannelFilter::new(".*", Some("CAM")).unwrap();
        assert!(!f.accepts("CAM"));
        assert!(f.accepts("CAMERA"));
        assert!(f.accepts("LIDAR"));
    }

    #[test]
    fn ignore_wins_over_include() {
        let f = ChannelFilter::new("CAM.*", Some("CAM_LEFT")).unwrap();
        assert!(!f.accepts("CAM_LEFT"));
        assert!(f.accepts("CAM_RIGHT"));
    }

    #[test]
    fn default_pattern_accepts_everything() {
        let f = ChannelFilter::from_config(&ConvertConfig::default()).unwrap();
        assert!(f.accepts(""));
        assert!(f.accepts("anything"));
    }

    #[test]
    fn alternation_stays_grouped() {
        let f = ChannelFilter::new(".*", Some("A|B")).unwrap();
        assert!(!f.accepts("A"));
        assert!(!f.accepts("B"));
        assert!(f.accepts("AB"));
    }
}
