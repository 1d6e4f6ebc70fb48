//! Status and role enums.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a recorded payment.
///
/// Rows created by a provider-backed checkout start as `Pending` and only move
/// forward when the payment provider reports the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "payment_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Completed,
    Failed,
    Cancelled,
    Refunded,
}

impl PaymentStatus {
    /// All statuses, in display order.
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Completed,
        Self::Failed,
        Self::Cancelled,
        Self::Refunded,
    ];

    /// Whether a payment in this status may move to `next`.
    ///
    /// Pending payments settle exactly once; only completed payments can be
    /// refunded.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Completed | Self::Failed | Self::Cancelled)
                | (Self::Completed, Self::Refunded)
        )
    }

    /// Whether no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Failed | Self::Cancelled | Self::Refunded)
    }

    /// The `snake_case` name used in the database and the API.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("invalid payment status: {s}"))
    }
}

/// Coarse user role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "user_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Regular shopper.
    #[default]
    User,
    /// Back-office access to products, users and payments.
    Admin,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_settles_once() {
        let pending = PaymentStatus::Pending;
        assert!(pending.can_transition_to(PaymentStatus::Completed));
        assert!(pending.can_transition_to(PaymentStatus::Failed));
        assert!(pending.can_transition_to(PaymentStatus::Cancelled));
        assert!(!pending.can_transition_to(PaymentStatus::Refunded));
        assert!(!pending.can_transition_to(PaymentStatus::Pending));
    }

    #[test]
    fn test_only_completed_can_be_refunded() {
        assert!(PaymentStatus::Completed.can_transition_to(PaymentStatus::Refunded));
        assert!(!PaymentStatus::Failed.can_transition_to(PaymentStatus::Refunded));
        assert!(!PaymentStatus::Completed.can_transition_to(PaymentStatus::Failed));
    }

    #[test]
    fn test_terminal_statuses_have_no_transitions() {
        for from in PaymentStatus::ALL.into_iter().filter(|s| s.is_terminal()) {
            for to in PaymentStatus::ALL {
                assert!(!from.can_transition_to(to), "{from} -> {to}");
            }
        }
    }

    #[test]
    fn test_payment_status_parse_and_display() {
        for status in PaymentStatus::ALL {
            assert_eq!(status.to_string().parse::<PaymentStatus>().unwrap(), status);
        }
        assert!("settled".parse::<PaymentStatus>().is_err());
        assert_eq!(
            serde_json::to_string(&PaymentStatus::Cancelled).unwrap(),
            "\"cancelled\""
        );
    }

    #[test]
    fn test_user_role_parse() {
        assert_eq!("admin".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert_eq!("user".parse::<UserRole>().unwrap(), UserRole::User);
        assert!("Admin".parse::<UserRole>().is_err());
        assert_eq!(UserRole::default(), UserRole::User);
    }
}
