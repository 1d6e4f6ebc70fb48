//! Admin authorization.
//!
//! Every admin check in the storefront and the back-office goes through
//! [`AdminPolicy::is_admin`]. A user is an admin when their stored role is
//! `admin`, or when their email is on the configured bootstrap list (used to
//! create the first admin of a fresh install).

use std::collections::HashSet;

use crate::{Email, UserRole};

/// The admin authorization predicate.
#[derive(Debug, Clone, Default)]
pub struct AdminPolicy {
    bootstrap_emails: HashSet<Email>,
}

impl AdminPolicy {
    /// Create a policy from a list of bootstrap admin emails.
    #[must_use]
    pub fn new(bootstrap_emails: impl IntoIterator<Item = Email>) -> Self {
        Self {
            bootstrap_emails: bootstrap_emails.into_iter().collect(),
        }
    }

    /// Parse a comma-separated list such as the `ADMIN_EMAILS` variable.
    ///
    /// Blank entries are skipped.
    ///
    /// # Errors
    ///
    /// Returns the first entry that is not a valid email.
    pub fn from_csv(list: &str) -> Result<Self, String> {
        let emails = list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| Email::parse(s).map_err(|e| format!("{s}: {e}")))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(emails))
    }

    /// Whether `email` is a bootstrap admin.
    #[must_use]
    pub fn is_bootstrap_admin(&self, email: &Email) -> bool {
        self.bootstrap_emails.contains(email)
    }

    /// The authorization predicate.
    #[must_use]
    pub fn is_admin(&self, role: UserRole, email: &Email) -> bool {
        role == UserRole::Admin || self.is_bootstrap_admin(email)
    }

    /// Role for a profile created on first sign-in.
    #[must_use]
    pub fn initial_role(&self, email: &Email) -> UserRole {
        if self.is_bootstrap_admin(email) {
            UserRole::Admin
        } else {
            UserRole::User
        }
    }

    /// Number of bootstrap emails.
    #[must_use]
    pub fn bootstrap_count(&self) -> usize {
        self.bootstrap_emails.len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn email(s: &str) -> Email {
        Email::parse(s).unwrap()
    }

    #[test]
    fn test_role_grants_admin() {
        let policy = AdminPolicy::default();
        assert!(policy.is_admin(UserRole::Admin, &email("a@x.com")));
        assert!(!policy.is_admin(UserRole::User, &email("a@x.com")));
    }

    #[test]
    fn test_bootstrap_email_grants_admin_case_insensitively() {
        let policy = AdminPolicy::from_csv("Owner@Stridewell.shop, ops@stridewell.shop").unwrap();
        assert_eq!(policy.bootstrap_count(), 2);
        assert!(policy.is_admin(UserRole::User, &email("owner@stridewell.shop")));
        assert!(policy.is_admin(UserRole::User, &email("OPS@stridewell.shop")));
        assert!(!policy.is_admin(UserRole::User, &email("shopper@stridewell.shop")));
    }

    #[test]
    fn test_initial_role() {
        let policy = AdminPolicy::from_csv("owner@stridewell.shop").unwrap();
        assert_eq!(
            policy.initial_role(&email("owner@stridewell.shop")),
            UserRole::Admin
        );
        assert_eq!(
            policy.initial_role(&email("someone@else.com")),
            UserRole::User
        );
    }

    #[test]
    fn test_from_csv_skips_blanks_and_rejects_invalid() {
        assert_eq!(AdminPolicy::from_csv("").unwrap().bootstrap_count(), 0);
        assert_eq!(AdminPolicy::from_csv(" , ,").unwrap().bootstrap_count(), 0);
        assert!(AdminPolicy::from_csv("ok@x.com,not-an-email").is_err());
    }
}
