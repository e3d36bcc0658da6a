//! Lock manager configuration

use std::time::Duration;

/// Lock manager options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockManagerConfig {
    /// Maximum time a request may wait before failing with a timeout.
    /// `None` waits indefinitely.
    pub acquire_timeout: Option<Duration>,
    /// Refuse requests that would close a cycle in the wait-for graph
    pub deadlock_detection: bool,
}

impl Default for LockManagerConfig {
    fn default() -> Self {
        LockManagerConfig {
            acquire_timeout: None,
            deadlock_detection: true,
        }
    }
}

impl LockManagerConfig {
    /// Default options with a bounded wait
    pub fn with_timeout(timeout: Duration) -> Self {
        LockManagerConfig {
            acquire_timeout: Some(timeout),
            ..Default::default()
        }
    }

    /// Disable deadlock detection
    ///
    /// Deadlocked transactions then only make progress if a timeout is set.
    pub fn no_deadlock_detection() -> Self {
        LockManagerConfig {
            deadlock_detection: false,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let cfg = LockManagerConfig::default();
        assert_eq!(cfg.acquire_timeout, None);
        assert!(cfg.deadlock_detection);
    }

    #[test]
    fn test_config_with_timeout() {
        let cfg = LockManagerConfig::with_timeout(Duration::from_millis(50));
        assert_eq!(cfg.acquire_timeout, Some(Duration::from_millis(50)));
        assert!(cfg.deadlock_detection);
    }

    #[test]
    fn test_config_no_deadlock_detection() {
        let cfg = LockManagerConfig::no_deadlock_detection();
        assert!(!cfg.deadlock_detection);
        assert_eq!(cfg.acquire_timeout, None);
    }
}
