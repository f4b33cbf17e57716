//! Nudge presentation decisions: which reminders count as upcoming today and
//! what a client should say about them. The answer is served as data from
//! `GET /api/reminders/nudge`; clients only render it.

use crate::models::Reminder;

/// Reminders whose deadline is today or later, today inclusive.
pub fn upcoming<'a>(reminders: &'a [Reminder], today: &str) -> Vec<&'a Reminder> {
    reminders
        .iter()
        .filter(|r| r.date.as_str() >= today)
        .collect()
}

/// Summary line for `count` upcoming deadlines, or `None` when there is
/// nothing to say.
pub fn nudge_message(count: usize) -> Option<String> {
    if count == 0 {
        return None;
    }
    let plural = if count > 1 { "s" } else { "" };
    Some(format!(
        "You have {} upcoming deadline{}. Stay on it!",
        count, plural
    ))
}

/// State of the ambient notification permission on a client. Display itself
/// is best-effort and outside the data contract; this only tracks whether it
/// may be attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationCapability {
    Unsupported,
    Undetermined,
    Granted,
    Denied,
}

impl NotificationCapability {
    /// Applies the outcome of a user-consent prompt. Only the undetermined
    /// state can move; an unsupported platform or a prior denial is final.
    pub fn request_consent(self, granted: bool) -> Self {
        match self {
            NotificationCapability::Undetermined => {
                if granted {
                    NotificationCapability::Granted
                } else {
                    NotificationCapability::Denied
                }
            }
            other => other,
        }
    }

    pub fn can_display(self) -> bool {
        self == NotificationCapability::Granted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn reminder(date: &str) -> Reminder {
        Reminder {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "Essay".to_string(),
            date: date.to_string(),
            time: None,
            created_at: Utc::now(),
            notified_days: Vec::new(),
        }
    }

    #[test]
    fn today_is_upcoming_but_yesterday_is_not() {
        let reminders = vec![
            reminder("2025-05-31"),
            reminder("2025-06-01"),
            reminder("2025-06-02"),
        ];
        let dates: Vec<&str> = upcoming(&reminders, "2025-06-01")
            .into_iter()
            .map(|r| r.date.as_str())
            .collect();
        assert_eq!(dates, vec!["2025-06-01", "2025-06-02"]);
    }

    #[test]
    fn message_pluralizes_and_goes_quiet_at_zero() {
        assert_eq!(nudge_message(0), None);
        assert_eq!(
            nudge_message(1).unwrap(),
            "You have 1 upcoming deadline. Stay on it!"
        );
        assert_eq!(
            nudge_message(3).unwrap(),
            "You have 3 upcoming deadlines. Stay on it!"
        );
    }

    #[test]
    fn consent_transitions() {
        use NotificationCapability::*;
        assert_eq!(Undetermined.request_consent(true), Granted);
        assert_eq!(Undetermined.request_consent(false), Denied);
        assert_eq!(Denied.request_consent(true), Denied);
        assert_eq!(Unsupported.request_consent(true), Unsupported);
        assert!(Granted.can_display());
        assert!(!Denied.can_display());
    }
}
