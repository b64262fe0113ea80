// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Topic filtering for sequential reads.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::{BagError, Result};

/// Selects which topics a reader returns.
#[derive(Clone, Default)]
pub enum TopicFilter {
    /// Every topic
    #[default]
    All,
    /// Only the named topics
    Include(HashSet<String>),
    /// Every topic except the named ones
    Exclude(HashSet<String>),
    /// Topics matching a regex
    Regex(Arc<regex::Regex>),
    /// Custom predicate on the topic name
    Custom(Arc<dyn Fn(&str) -> bool + Send + Sync>),
}

impl fmt::Debug for TopicFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.debug_tuple("All").finish(),
            Self::Include(v) => f.debug_tuple("Include").field(v).finish(),
            Self::Exclude(v) => f.debug_tuple("Exclude").field(v).finish(),
            Self::Regex(re) => f.debug_tuple("Regex").field(&re.as_str()).finish(),
            Self::Custom(_) => f.debug_tuple("Custom").field(&"<fn>").finish(),
        }
    }
}

impl TopicFilter {
    /// Check if records of a topic pass the filter.
    pub fn should_include(&self, topic: &str) -> bool {
        match self {
            TopicFilter::All => true,
            TopicFilter::Include(topics) => topics.contains(topic),
            TopicFilter::Exclude(topics) => !topics.contains(topic),
            TopicFilter::Regex(re) => re.is_match(topic),
            TopicFilter::Custom(f) => f(topic),
        }
    }

    /// Whether the filter lets everything through.
    pub fn is_all(&self) -> bool {
        matches!(self, TopicFilter::All)
    }

    /// Keep only the named topics.
    pub fn include<I, S>(topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Include(topics.into_iter().map(Into::into).collect())
    }

    /// Drop the named topics.
    pub fn exclude<I, S>(topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Exclude(topics.into_iter().map(Into::into).collect())
    }

    /// Keep topics matching `pattern`.
    pub fn regex(pattern: &str) -> Result<Self> {
        regex::Regex::new(pattern)
            .map(|re| Self::Regex(Arc::new(re)))
            .map_err(|e| BagError::InvalidOptions(format!("invalid topic pattern: {e}")))
    }

    /// Keep topics for which `f` returns true.
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_filter_all() {
        let filter = TopicFilter::default();
        assert!(filter.is_all());
        assert!(filter.should_include("/any_topic"));
    }

    #[test]
    fn test_topic_filter_include() {
        let filter = TopicFilter::include(["/camera/image_raw", "/lidar/points"]);
        assert!(filter.should_include("/camera/image_raw"));
        assert!(filter.should_include("/lidar/points"));
        assert!(!filter.should_include("/imu/data"));
        assert!(!filter.is_all());
    }

    #[test]
    fn test_topic_filter_exclude() {
        let filter = TopicFilter::exclude(vec!["/tf".to_string()]);
        assert!(!filter.should_include("/tf"));
        assert!(filter.should_include("/camera"));
    }

    #[test]
    fn test_topic_filter_regex() {
        let filter = TopicFilter::regex("^/camera/").unwrap();
        assert!(filter.should_include("/camera/image_raw"));
        assert!(!filter.should_include("/lidar/points"));
        assert!(format!("{filter:?}").contains("^/camera/"));
    }

    #[test]
    fn test_invalid_regex() {
        assert!(matches!(
            TopicFilter::regex("(unclosed"),
            Err(BagError::InvalidOptions(_))
        ));
    }

    #[test]
    fn test_custom_filter() {
        let filter = TopicFilter::custom(|t| t.ends_with("_raw"));
        assert!(filter.should_include("/camera/image_raw"));
        assert!(!filter.should_include("/camera/info"));
    }
}
