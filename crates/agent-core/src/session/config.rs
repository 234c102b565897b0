//! Session configuration

use std::time::Duration;

use crate::events::EventVocabulary;

/// Configuration for a [`super::SessionManager`]
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
/// use dialdesk_agent_core::SessionConfig;
///
/// let config = SessionConfig::new().with_grace_delay(Duration::from_millis(250));
/// assert_eq!(config.grace_delay, Duration::from_millis(250));
/// ```
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long qualification context is preserved after a call ends before
    /// the call session resets to idle
    pub grace_delay: Duration,
    /// Wire names accepted for each push event
    pub vocabulary: EventVocabulary,
}

impl SessionConfig {
    /// Create a configuration with the default 500 ms grace delay and the
    /// consolidated event vocabulary
    pub fn new() -> Self {
        Self {
            grace_delay: Duration::from_millis(500),
            vocabulary: EventVocabulary::default(),
        }
    }

    /// Override the post-call grace delay
    pub fn with_grace_delay(mut self, delay: Duration) -> Self {
        self.grace_delay = delay;
        self
    }

    /// Override the push-event vocabulary
    pub fn with_vocabulary(mut self, vocabulary: EventVocabulary) -> Self {
        self.vocabulary = vocabulary;
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new()
    }
}
