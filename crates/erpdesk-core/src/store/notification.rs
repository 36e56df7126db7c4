use chrono::{DateTime, Duration, Utc};

/// How long success and info notifications stay visible
const SHORT_LIFETIME_MS: i64 = 3000;

/// Errors stay up longer so the detail can be read
const ERROR_LIFETIME_MS: i64 = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Info,
    Error,
}

/// A transient, non-blocking message for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    fn new(level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            created_at: Utc::now(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Success, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Info, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Error, message)
    }

    pub fn is_error(&self) -> bool {
        self.level == NotificationLevel::Error
    }

    pub fn lifetime(&self) -> Duration {
        match self.level {
            NotificationLevel::Error => Duration::milliseconds(ERROR_LIFETIME_MS),
            NotificationLevel::Success | NotificationLevel::Info => Duration::milliseconds(SHORT_LIFETIME_MS),
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now - self.created_at > self.lifetime()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifetimes() {
        assert_eq!(Notification::success("ok").lifetime(), Duration::seconds(3));
        assert_eq!(Notification::error("bad").lifetime(), Duration::seconds(5));
    }

    #[test]
    fn test_expiry() {
        let note = Notification::error("bad");
        assert!(!note.is_expired_at(note.created_at + Duration::seconds(4)));
        assert!(note.is_expired_at(note.created_at + Duration::seconds(6)));
    }
}
