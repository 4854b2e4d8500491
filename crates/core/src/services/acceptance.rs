//! Submission acceptance window.

use chrono::{DateTime, Utc};
use collexo_common::AppError;
use collexo_db::entities::society_form;
use serde::Serialize;
use thiserror::Error;

/// Rule that stopped a form from accepting submissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotAcceptingReason {
    #[error("form is not active")]
    Inactive,
    #[error("form has not opened yet")]
    NotYetOpen,
    #[error("form has closed")]
    Closed,
    #[error("submission limit reached")]
    Full,
}

impl From<NotAcceptingReason> for AppError {
    fn from(reason: NotAcceptingReason) -> Self {
        Self::NotAccepting(reason.to_string())
    }
}

/// The part of a form that decides whether it takes submissions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormState {
    pub is_active: bool,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub max_submissions: Option<i32>,
    pub submissions_count: i32,
}

impl From<&society_form::Model> for FormState {
    fn from(form: &society_form::Model) -> Self {
        Self {
            is_active: form.is_active,
            start_date: form.start_date.map(|d| d.with_timezone(&Utc)),
            end_date: form.end_date.map(|d| d.with_timezone(&Utc)),
            max_submissions: form.max_submissions,
            submissions_count: form.submissions_count,
        }
    }
}

impl FormState {
    /// Evaluate the rules in order and report the first one that fails.
    ///
    /// Both window bounds are inclusive.
    pub fn check(&self, now: DateTime<Utc>) -> Result<(), NotAcceptingReason> {
        if !self.is_active {
            return Err(NotAcceptingReason::Inactive);
        }
        if self.start_date.is_some_and(|start| now < start) {
            return Err(NotAcceptingReason::NotYetOpen);
        }
        if self.end_date.is_some_and(|end| now > end) {
            return Err(NotAcceptingReason::Closed);
        }
        if self
            .max_submissions
            .is_some_and(|max| self.submissions_count >= max)
        {
            return Err(NotAcceptingReason::Full);
        }
        Ok(())
    }

    /// Whether a submission made at `now` may be accepted.
    #[must_use]
    pub fn is_accepting(&self, now: DateTime<Utc>) -> bool {
        self.check(now).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn open_state() -> FormState {
        FormState {
            is_active: true,
            start_date: None,
            end_date: None,
            max_submissions: None,
            submissions_count: 0,
        }
    }

    #[test]
    fn test_open_form_accepts() {
        assert!(open_state().is_accepting(Utc::now()));
    }

    #[test]
    fn test_inactive_rejects_first() {
        let now = Utc::now();
        let state = FormState {
            is_active: false,
            start_date: Some(now + Duration::days(1)),
            max_submissions: Some(0),
            ..open_state()
        };
        assert_eq!(state.check(now), Err(NotAcceptingReason::Inactive));
        assert!(!state.is_accepting(now));
    }

    #[test]
    fn test_start_boundary_is_inclusive() {
        let start = Utc::now();
        let state = FormState {
            start_date: Some(start),
            ..open_state()
        };
        assert!(state.is_accepting(start));
        assert_eq!(
            state.check(start - Duration::seconds(1)),
            Err(NotAcceptingReason::NotYetOpen)
        );
    }

    #[test]
    fn test_end_boundary_is_inclusive() {
        let end = Utc::now();
        let state = FormState {
            end_date: Some(end),
            ..open_state()
        };
        assert!(state.is_accepting(end));
        assert_eq!(
            state.check(end + Duration::seconds(1)),
            Err(NotAcceptingReason::Closed)
        );
    }

    #[test]
    fn test_ceiling() {
        let now = Utc::now();
        let full = FormState {
            max_submissions: Some(1),
            submissions_count: 1,
            ..open_state()
        };
        let empty = FormState {
            max_submissions: Some(1),
            submissions_count: 0,
            ..open_state()
        };
        assert_eq!(full.check(now), Err(NotAcceptingReason::Full));
        assert!(empty.is_accepting(now));
    }

    #[test]
    fn test_reason_maps_to_not_accepting() {
        let err: AppError = NotAcceptingReason::Closed.into();
        assert!(matches!(err, AppError::NotAccepting(msg) if msg == "form has closed"));
    }
}
