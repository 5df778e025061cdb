//! Autoplay Policy
//!
//! Decides whether a `play()` request may start playback without the user
//! having interacted with the page.

/// Autoplay policy in force for a document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AutoplayPolicy {
    /// Any playback is allowed (after a user gesture)
    Allowed,
    /// Only muted playback is allowed
    #[default]
    AllowedMuted,
    /// No playback without explicit user action
    Disallowed,
}

impl AutoplayPolicy {
    /// Whether playback with the given audio state is permitted
    pub fn permits(self, muted: bool) -> bool {
        match self {
            AutoplayPolicy::Allowed => true,
            AutoplayPolicy::AllowedMuted => muted,
            AutoplayPolicy::Disallowed => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permits() {
        assert!(AutoplayPolicy::Allowed.permits(false));
        assert!(AutoplayPolicy::AllowedMuted.permits(true));
        assert!(!AutoplayPolicy::AllowedMuted.permits(false));
        assert!(!AutoplayPolicy::Disallowed.permits(true));
    }
}
