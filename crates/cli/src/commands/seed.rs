//! Seed the catalog from a YAML file.
//!
//! The file is a list of products in the same shape the back-office
//! `POST /api/products` accepts:
//!
//! ```yaml
//! - title: Trail Runner 2
//!   brand: Stride
//!   category: Running
//!   price: "4599.00"
//!   sizes: ["40", "41", "42"]
//!   stock: 25
//! ```
//!
//! Every product is validated before anything is inserted.

use std::path::Path;

use stridewell_admin::db::{ProductRepository, UserRepository};
use stridewell_core::{Email, ProductDraft, UserId};

use super::{CommandError, connect};

/// Parse and validate a seed document, reporting every invalid entry.
fn parse_products(content: &str) -> Result<Vec<ProductDraft>, CommandError> {
    let drafts: Vec<ProductDraft> = serde_yaml::from_str(content)?;

    let mut valid = Vec::with_capacity(drafts.len());
    let mut errors = Vec::new();
    for (index, draft) in drafts.into_iter().enumerate() {
        match draft.validate() {
            Ok(draft) => valid.push(draft),
            Err(e) => errors.push((index, e)),
        }
    }

    if errors.is_empty() {
        Ok(valid)
    } else {
        Err(CommandError::InvalidProducts(errors))
    }
}

/// Insert the products in `file_path`, optionally owned by `owner_email`.
///
/// # Errors
///
/// Returns `CommandError` if the file cannot be read or parsed, any product
/// is invalid, the owner does not exist, or an insert fails.
pub async fn products(file_path: &str, owner_email: Option<&str>) -> Result<(), CommandError> {
    let path = Path::new(file_path);
    tracing::info!(path = %file_path, "Loading products from file");

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CommandError::ReadFile {
            path: file_path.to_string(),
            source,
        })?;

    let drafts = match parse_products(&content) {
        Err(CommandError::InvalidProducts(errors)) => {
            tracing::error!("Product validation failed:");
            for (index, err) in &errors {
                tracing::error!("  - product #{}: {err}", index + 1);
            }
            return Err(CommandError::InvalidProducts(errors));
        }
        other => other?,
    };
    tracing::info!(products = drafts.len(), "Products validated");

    let pool = connect().await?;

    let owner: Option<UserId> = match owner_email {
        Some(raw) => {
            let email = Email::parse(raw)?;
            let user = UserRepository::new(&pool)
                .get_by_email(&email)
                .await?
                .ok_or_else(|| CommandError::UserNotFound(email.into_inner()))?;
            Some(user.id)
        }
        None => None,
    };

    let repo = ProductRepository::new(&pool);
    for draft in &drafts {
        let product = repo.create(draft, owner).await?;
        tracing::info!(product_id = %product.id, title = %product.title, "Inserted");
    }

    tracing::info!("Seeding complete! {} products inserted", drafts.len());
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;
    use stridewell_core::ProductError;

    use super::*;

    #[test]
    fn test_parse_products_normalizes() {
        let yaml = r#"
- title: "  Trail Runner 2 "
  brand: Stride
  category: Running
  price: "4599.00"
  sizes: ["40", " 41 ", ""]
  stock: 25
- title: Everyday Socks
  price: 199
"#;
        let drafts = parse_products(yaml).unwrap();
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].title, "Trail Runner 2");
        assert_eq!(drafts[0].price, Decimal::new(459_900, 2));
        assert_eq!(drafts[0].sizes, vec!["40", "41"]);
        assert!(drafts[1].is_active);
    }

    #[test]
    fn test_parse_products_reports_every_invalid_entry() {
        let yaml = r#"
- title: ""
  price: "10.00"
- title: Fine
  price: "10.00"
- title: Negative
  price: "-1.00"
"#;
        let Err(CommandError::InvalidProducts(errors)) = parse_products(yaml) else {
            panic!("expected validation errors");
        };
        let indexes: Vec<usize> = errors.iter().map(|(i, _)| *i).collect();
        assert_eq!(indexes, vec![0, 2]);
        assert!(matches!(errors[0].1, ProductError::EmptyTitle));
        assert!(matches!(errors[1].1, ProductError::NonPositivePrice));
    }

    #[test]
    fn test_parse_products_rejects_non_list() {
        assert!(matches!(
            parse_products("title: lonely"),
            Err(CommandError::Yaml(_))
        ));
    }
}
