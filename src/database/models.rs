use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Menu {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UrlItem {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

/// Content page owned by the host CMS. Read-only from this service.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PageRef {
    pub id: i64,
    pub title: String,
}

/// Where a menu item points. Exactly one variant per item; the
/// neither/both state is rejected before a row is ever written.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MenuTarget {
    /// Internal content page. `title` is None when the page row has
    /// disappeared under us (pages belong to the host system).
    Page { id: i64, title: Option<String> },
    /// Shared external-link record.
    Url { id: i64, name: String, url: String },
}

impl MenuTarget {
    /// Display name of the target. A dangling page reference resolves to
    /// an empty string rather than an error so the list view never breaks.
    pub fn name(&self) -> String {
        match self {
            MenuTarget::Page { title, .. } => title.clone().unwrap_or_default(),
            MenuTarget::Url { name, .. } => name.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MenuItem {
    pub id: i64,
    pub menu_id: i64,
    /// Optional caption override; the target's name is used when unset.
    pub name: Option<String>,
    pub rank: i32,
    pub target: MenuTarget,
    pub created_at: DateTime<Utc>,
}

impl MenuItem {
    pub fn effective_name(&self) -> String {
        match &self.name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => self.target.name(),
        }
    }
}

// Internal row type for SQLx mapping (menu_items joined with pages and
// url_items).
#[derive(Debug, FromRow)]
pub(crate) struct MenuItemRow {
    pub id: i64,
    pub menu_id: i64,
    pub name: Option<String>,
    pub rank: i32,
    pub page_id: Option<i64>,
    pub page_title: Option<String>,
    pub url_item_id: Option<i64>,
    pub url_name: Option<String>,
    pub url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<MenuItemRow> for MenuItem {
    type Error = anyhow::Error;

    fn try_from(row: MenuItemRow) -> Result<Self, Self::Error> {
        let target = match (row.page_id, row.url_item_id) {
            (Some(id), None) => MenuTarget::Page {
                id,
                title: row.page_title,
            },
            (None, Some(id)) => MenuTarget::Url {
                id,
                name: row.url_name.unwrap_or_default(),
                url: row.url.unwrap_or_default(),
            },
            // Guarded by a CHECK constraint; reaching here means the schema
            // was modified out of band.
            _ => anyhow::bail!("menu item {} has no resolvable target", row.id),
        };

        Ok(MenuItem {
            id: row.id,
            menu_id: row.menu_id,
            name: row.name,
            rank: row.rank,
            target,
            created_at: row.created_at,
        })
    }
}
