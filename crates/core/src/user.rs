//! User profiles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Email, UserId, UserRole};

/// Maximum length of a first or last name.
pub const MAX_NAME_LENGTH: usize = 100;

/// A user's profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct UserProfile {
    pub id: UserId,
    pub email: Email,
    pub role: UserRole,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    /// Full name if any part is set, otherwise the email's local part.
    #[must_use]
    pub fn display_name(&self) -> String {
        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();

        if parts.is_empty() {
            self.email.local_part().to_owned()
        } else {
            parts.join(" ")
        }
    }
}

/// Invalid profile input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileError {
    #[error("{0} must be at most {MAX_NAME_LENGTH} characters")]
    NameTooLong(&'static str),
    #[error("avatar must be an absolute http(s) URL")]
    InvalidAvatarUrl,
}

/// Self-service profile changes. Absent fields are left unchanged and blank
/// fields are cleared.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub avatar_url: Option<String>,
}

impl ProfileUpdate {
    /// Validate and trim the update.
    ///
    /// # Errors
    ///
    /// Returns `ProfileError` for overlong names or a non-http(s) avatar URL.
    pub fn validate(self) -> Result<Self, ProfileError> {
        let first_name = check_name(self.first_name, "first_name")?;
        let last_name = check_name(self.last_name, "last_name")?;
        let avatar_url = self.avatar_url.map(|u| u.trim().to_owned());
        if let Some(url) = avatar_url.as_deref().filter(|u| !u.is_empty()) {
            let ok = url::Url::parse(url).is_ok_and(|u| matches!(u.scheme(), "http" | "https"));
            if !ok {
                return Err(ProfileError::InvalidAvatarUrl);
            }
        }
        Ok(Self {
            first_name,
            last_name,
            avatar_url,
        })
    }
}

fn check_name(
    value: Option<String>,
    field: &'static str,
) -> Result<Option<String>, ProfileError> {
    let value = value.map(|v| v.trim().to_owned());
    if value
        .as_deref()
        .is_some_and(|v| v.chars().count() > MAX_NAME_LENGTH)
    {
        return Err(ProfileError::NameTooLong(field));
    }
    Ok(value)
}

/// Turn a validated optional field into the value to store: `None` keeps the
/// current value, `Some("")` clears it.
#[must_use]
pub fn merge_field(update: Option<String>, current: Option<String>) -> Option<String> {
    match update {
        None => current,
        Some(v) if v.is_empty() => None,
        Some(v) => Some(v),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn profile(first: Option<&str>, last: Option<&str>) -> UserProfile {
        let now = Utc::now();
        UserProfile {
            id: UserId::new(1),
            email: Email::parse("jamie.cruz@example.com").unwrap(),
            role: UserRole::User,
            first_name: first.map(String::from),
            last_name: last.map(String::from),
            avatar_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_display_name() {
        assert_eq!(profile(Some("Jamie"), Some("Cruz")).display_name(), "Jamie Cruz");
        assert_eq!(profile(Some("Jamie"), None).display_name(), "Jamie");
        assert_eq!(profile(Some("  "), None).display_name(), "jamie.cruz");
        assert_eq!(profile(None, None).display_name(), "jamie.cruz");
    }

    #[test]
    fn test_update_validation() {
        let update = ProfileUpdate {
            first_name: Some("  Jamie ".into()),
            last_name: None,
            avatar_url: Some("https://img.example.com/a.png".into()),
        }
        .validate()
        .unwrap();
        assert_eq!(update.first_name.as_deref(), Some("Jamie"));

        let bad = ProfileUpdate {
            avatar_url: Some("ftp://x/a.png".into()),
            ..ProfileUpdate::default()
        };
        assert_eq!(bad.validate(), Err(ProfileError::InvalidAvatarUrl));

        let long = ProfileUpdate {
            last_name: Some("x".repeat(MAX_NAME_LENGTH + 1)),
            ..ProfileUpdate::default()
        };
        assert_eq!(long.validate(), Err(ProfileError::NameTooLong("last_name")));
    }

    #[test]
    fn test_merge_field() {
        assert_eq!(merge_field(None, Some("a".into())), Some("a".into()));
        assert_eq!(merge_field(Some(String::new()), Some("a".into())), None);
        assert_eq!(merge_field(Some("b".into()), None), Some("b".into()));
    }
}
