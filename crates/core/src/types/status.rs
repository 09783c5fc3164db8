//! Lifecycle and role enums.
//!
//! [`ContactStatus`] is the state machine every contact message moves
//! through. The business rule today is "any state to any state by explicit
//! admin action"; the rule lives in [`ContactStatus::can_transition_to`] so
//! it can be tightened in one place.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle stage of a contact message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "semecall.contact_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum ContactStatus {
    /// Just submitted through the public form.
    #[default]
    New,
    /// An admin has marked it as read.
    Read,
    /// A reply email has been dispatched for it.
    Replied,
    /// Filed away. Not terminal: an admin may reopen it.
    Archived,
}

impl ContactStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 4] = [Self::New, Self::Read, Self::Replied, Self::Archived];

    /// Wire/database spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Read => "read",
            Self::Replied => "replied",
            Self::Archived => "archived",
        }
    }

    /// Whether an admin may move a message from `self` to `next`.
    ///
    /// All pairs are allowed, including re-applying the current status.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        match (self, next) {
            (
                Self::New | Self::Read | Self::Replied | Self::Archived,
                Self::New | Self::Read | Self::Replied | Self::Archived,
            ) => true,
        }
    }

    /// Validate a transition and return the resulting status.
    ///
    /// # Errors
    ///
    /// Returns [`StatusTransitionError`] if the transition is not permitted.
    pub const fn transition_to(self, next: Self) -> Result<Self, StatusTransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(StatusTransitionError {
                from: self,
                to: next,
            })
        }
    }
}

impl fmt::Display for ContactStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unknown status string.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid status: {0:?} (expected new, read, replied or archived)")]
pub struct ParseStatusError(pub String);

impl FromStr for ContactStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "new" => Ok(Self::New),
            "read" => Ok(Self::Read),
            "replied" => Ok(Self::Replied),
            "archived" => Ok(Self::Archived),
            other => Err(ParseStatusError(other.to_owned())),
        }
    }
}

/// A rejected status change.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("cannot move a message from {from} to {to}")]
pub struct StatusTransitionError {
    /// Current status.
    pub from: ContactStatus,
    /// Requested status.
    pub to: ContactStatus,
}

/// Inbox filter: everything, or a single status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    /// No filtering.
    #[default]
    All,
    /// Only messages in this status.
    Only(ContactStatus),
}

impl StatusFilter {
    /// Parse an optional query value; absent, empty and `all` mean [`StatusFilter::All`].
    ///
    /// # Errors
    ///
    /// Returns [`ParseStatusError`] for any other unknown value.
    pub fn from_query(value: Option<&str>) -> Result<Self, ParseStatusError> {
        match value.map(str::trim) {
            None | Some("" | "all") => Ok(Self::All),
            Some(other) => other.parse().map(Self::Only),
        }
    }

    /// The status to filter on, if any.
    #[must_use]
    pub const fn status(self) -> Option<ContactStatus> {
        match self {
            Self::All => None,
            Self::Only(status) => Some(status),
        }
    }
}

impl From<ContactStatus> for StatusFilter {
    fn from(status: ContactStatus) -> Self {
        Self::Only(status)
    }
}

/// Back-office account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "semecall.admin_role", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum AdminRole {
    /// Full access, including account management.
    #[default]
    Admin,
    /// Inbox handling.
    Moderator,
}

impl fmt::Display for AdminRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin => f.write_str("admin"),
            Self::Moderator => f.write_str("moderator"),
        }
    }
}

impl FromStr for AdminRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "admin" => Ok(Self::Admin),
            "moderator" => Ok(Self::Moderator),
            _ => Err(format!("invalid admin role: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_every_transition_is_allowed() {
        for from in ContactStatus::ALL {
            for to in ContactStatus::ALL {
                assert_eq!(from.transition_to(to), Ok(to), "{from} -> {to}");
            }
        }
    }

    #[test]
    fn test_archived_can_be_reopened() {
        assert!(ContactStatus::Archived.can_transition_to(ContactStatus::New));
    }

    #[test]
    fn test_status_round_trips_through_str() {
        for status in ContactStatus::ALL {
            assert_eq!(status.as_str().parse::<ContactStatus>().unwrap(), status);
            assert_eq!(status.to_string(), status.as_str());
        }
        assert!("spam".parse::<ContactStatus>().is_err());
        assert!("NEW".parse::<ContactStatus>().is_err());
    }

    #[test]
    fn test_status_serde_is_lowercase() {
        let json = serde_json::to_string(&ContactStatus::Replied).unwrap();
        assert_eq!(json, "\"replied\"");
        let parsed: ContactStatus = serde_json::from_str("\"archived\"").unwrap();
        assert_eq!(parsed, ContactStatus::Archived);
    }

    #[test]
    fn test_filter_from_query() {
        assert_eq!(StatusFilter::from_query(None).unwrap(), StatusFilter::All);
        assert_eq!(StatusFilter::from_query(Some("all")).unwrap(), StatusFilter::All);
        assert_eq!(StatusFilter::from_query(Some("")).unwrap(), StatusFilter::All);
        assert_eq!(
            StatusFilter::from_query(Some("read")).unwrap(),
            StatusFilter::Only(ContactStatus::Read)
        );
        assert!(StatusFilter::from_query(Some("deleted")).is_err());
    }

    #[test]
    fn test_default_status_is_new() {
        assert_eq!(ContactStatus::default(), ContactStatus::New);
    }

    #[test]
    fn test_admin_role_parse() {
        assert_eq!("admin".parse::<AdminRole>().unwrap(), AdminRole::Admin);
        assert_eq!("moderator".parse::<AdminRole>().unwrap(), AdminRole::Moderator);
        assert!("super_admin".parse::<AdminRole>().is_err());
        assert_eq!(AdminRole::Moderator.to_string(), "moderator");
    }
}
