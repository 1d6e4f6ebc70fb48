//! Back-office record kinds addressed by path segment.

use serde::{Deserialize, Serialize};

/// A record kind in `/api/bulk/{entity}/...` and `/api/tables/{entity}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Entity {
    Products,
    Users,
    Payments,
}

impl Entity {
    /// The path segment and export file prefix.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::Users => "users",
            Self::Payments => "payments",
        }
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_from_path_segment() {
        let e: Entity = serde_json::from_str("\"payments\"").unwrap();
        assert_eq!(e, Entity::Payments);
        assert!(serde_json::from_str::<Entity>("\"orders\"").is_err());
        assert_eq!(Entity::Products.to_string(), "products");
    }
}
