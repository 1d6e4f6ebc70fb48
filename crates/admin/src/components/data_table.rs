//! Data table configuration served to the back-office UI.
//!
//! The UI renders every list page from one of these configs: which columns
//! exist, which filters map to which query parameters, and which bulk
//! actions the `/api/bulk` endpoints accept for the table.

use serde::Serialize;

use stridewell_core::{PaymentStatus, UserRole};

use crate::models::Entity;

/// Column definition for a data table.
#[derive(Debug, Clone, Serialize)]
pub struct TableColumn {
    /// Field name in the list response.
    pub key: &'static str,
    /// Display label for the column header.
    pub label: &'static str,
    /// Whether the column is visible by default.
    pub default_visible: bool,
}

impl TableColumn {
    /// Create a visible column.
    #[must_use]
    pub const fn new(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            default_visible: true,
        }
    }

    /// Hide the column until the user picks it.
    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.default_visible = false;
        self
    }
}

/// Filter input kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterType {
    /// Free text.
    Text,
    /// Single-select dropdown.
    Select,
}

/// Option for a select filter.
#[derive(Debug, Clone, Serialize)]
pub struct FilterOption {
    pub value: String,
    pub label: String,
}

impl FilterOption {
    /// Create a new filter option.
    #[must_use]
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Filter definition; `key` is the list endpoint's query parameter.
#[derive(Debug, Clone, Serialize)]
pub struct TableFilter {
    pub key: &'static str,
    pub label: &'static str,
    pub filter_type: FilterType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<&'static str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<FilterOption>,
}

impl TableFilter {
    /// Create a text filter.
    #[must_use]
    pub const fn text(key: &'static str, label: &'static str, placeholder: &'static str) -> Self {
        Self {
            key,
            label,
            filter_type: FilterType::Text,
            placeholder: Some(placeholder),
            options: Vec::new(),
        }
    }

    /// Create a select filter.
    #[must_use]
    pub const fn select(key: &'static str, label: &'static str, options: Vec<FilterOption>) -> Self {
        Self {
            key,
            label,
            filter_type: FilterType::Select,
            placeholder: None,
            options,
        }
    }
}

/// Bulk action definition; `key` names the `/api/bulk/{entity}/{key}` endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct BulkAction {
    pub key: &'static str,
    pub label: &'static str,
    /// Whether the UI should ask for confirmation.
    pub destructive: bool,
}

impl BulkAction {
    /// Create a new bulk action.
    #[must_use]
    pub const fn new(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            destructive: false,
        }
    }

    /// Mark this action as destructive.
    #[must_use]
    pub const fn destructive(mut self) -> Self {
        self.destructive = true;
        self
    }
}

/// Configuration for a data table.
#[derive(Debug, Clone, Serialize)]
pub struct DataTableConfig {
    pub table_id: Entity,
    pub columns: Vec<TableColumn>,
    pub filters: Vec<TableFilter>,
    pub bulk_actions: Vec<BulkAction>,
    pub search_placeholder: &'static str,
    pub empty_title: &'static str,
}

impl DataTableConfig {
    /// Create an empty configuration for `entity`.
    #[must_use]
    pub const fn new(entity: Entity) -> Self {
        Self {
            table_id: entity,
            columns: Vec::new(),
            filters: Vec::new(),
            bulk_actions: Vec::new(),
            search_placeholder: "Search...",
            empty_title: "No items found",
        }
    }

    /// Add a column.
    #[must_use]
    pub fn column(mut self, column: TableColumn) -> Self {
        self.columns.push(column);
        self
    }

    /// Add a filter.
    #[must_use]
    pub fn filter(mut self, filter: TableFilter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Add a bulk action.
    #[must_use]
    pub fn bulk_action(mut self, action: BulkAction) -> Self {
        self.bulk_actions.push(action);
        self
    }

    /// Set search placeholder.
    #[must_use]
    pub const fn search_placeholder(mut self, placeholder: &'static str) -> Self {
        self.search_placeholder = placeholder;
        self
    }

    /// Set the empty-state title.
    #[must_use]
    pub const fn empty_title(mut self, title: &'static str) -> Self {
        self.empty_title = title;
        self
    }

    /// Keys of the columns visible by default.
    #[must_use]
    pub fn default_columns(&self) -> Vec<&'static str> {
        self.columns
            .iter()
            .filter(|c| c.default_visible)
            .map(|c| c.key)
            .collect()
    }
}

/// The table configuration for `entity`.
#[must_use]
pub fn table_config(entity: Entity) -> DataTableConfig {
    match entity {
        Entity::Products => products_table_config(),
        Entity::Users => users_table_config(),
        Entity::Payments => payments_table_config(),
    }
}

fn common_bulk_actions(config: DataTableConfig) -> DataTableConfig {
    config
        .bulk_action(BulkAction::new("export", "Export JSON"))
        .bulk_action(BulkAction::new("delete", "Delete").destructive())
}

fn products_table_config() -> DataTableConfig {
    let config = DataTableConfig::new(Entity::Products)
        .column(TableColumn::new("title", "Product"))
        .column(TableColumn::new("brand", "Brand"))
        .column(TableColumn::new("category", "Category"))
        .column(TableColumn::new("price", "Price"))
        .column(TableColumn::new("stock", "Stock"))
        .column(TableColumn::new("is_active", "Active"))
        .column(TableColumn::new("sizes", "Sizes").hidden())
        .column(TableColumn::new("tags", "Tags").hidden())
        .column(TableColumn::new("created_at", "Created").hidden())
        .filter(TableFilter::select(
            "status",
            "Status",
            vec![
                FilterOption::new("active", "Active"),
                FilterOption::new("inactive", "Inactive"),
            ],
        ))
        .bulk_action(BulkAction::new("status", "Set Status"))
        .search_placeholder("Search by title, brand, or description...")
        .empty_title("No products found");
    common_bulk_actions(config)
}

fn users_table_config() -> DataTableConfig {
    let roles = [UserRole::User, UserRole::Admin]
        .into_iter()
        .map(|r| FilterOption::new(r.to_string(), capitalize(&r.to_string())))
        .collect();

    let config = DataTableConfig::new(Entity::Users)
        .column(TableColumn::new("email", "Email"))
        .column(TableColumn::new("first_name", "First Name"))
        .column(TableColumn::new("last_name", "Last Name"))
        .column(TableColumn::new("role", "Role"))
        .column(TableColumn::new("created_at", "Joined"))
        .filter(TableFilter::select("role", "Role", roles))
        .search_placeholder("Search by email or name...")
        .empty_title("No users found");
    common_bulk_actions(config)
}

fn payments_table_config() -> DataTableConfig {
    let statuses = PaymentStatus::ALL
        .into_iter()
        .map(|s| FilterOption::new(s.as_str(), capitalize(s.as_str())))
        .collect();

    let config = DataTableConfig::new(Entity::Payments)
        .column(TableColumn::new("user_email", "Customer"))
        .column(TableColumn::new("product_title", "Product"))
        .column(TableColumn::new("amount", "Amount"))
        .column(TableColumn::new("status", "Status"))
        .column(TableColumn::new("payment_method", "Method").hidden())
        .column(TableColumn::new("stripe_payment_intent_id", "Payment Intent").hidden())
        .column(TableColumn::new("created_at", "Date"))
        .filter(TableFilter::select("status", "Status", statuses))
        .search_placeholder("Search by customer email or product...")
        .empty_title("No payments found");
    common_bulk_actions(config)
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_every_table_has_search_and_delete() {
        for entity in [Entity::Products, Entity::Users, Entity::Payments] {
            let config = table_config(entity);
            assert_eq!(config.table_id, entity);
            assert!(!config.columns.is_empty());
            assert!(
                config
                    .bulk_actions
                    .iter()
                    .any(|a| a.key == "delete" && a.destructive)
            );
            assert!(config.bulk_actions.iter().any(|a| a.key == "export"));
        }
    }

    #[test]
    fn test_only_products_have_status_action() {
        let has_status = |e| table_config(e).bulk_actions.iter().any(|a| a.key == "status");
        assert!(has_status(Entity::Products));
        assert!(!has_status(Entity::Users));
        assert!(!has_status(Entity::Payments));
    }

    #[test]
    fn test_payment_status_filter_lists_all_statuses() {
        let config = table_config(Entity::Payments);
        let status = config.filters.iter().find(|f| f.key == "status").unwrap();
        assert_eq!(status.options.len(), PaymentStatus::ALL.len());
        assert_eq!(status.options[0].label, "Pending");
    }

    #[test]
    fn test_default_columns_skip_hidden() {
        let config = table_config(Entity::Products);
        let visible = config.default_columns();
        assert!(visible.contains(&"title"));
        assert!(!visible.contains(&"tags"));
    }
}
