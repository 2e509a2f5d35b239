//! CRUD for menus, menu items, and URL items, including target resolution
//! on the write path.

use crate::database::{Menu, MenuItem, Repository, UrlItem};
use crate::utils::error::ApiError;
use std::sync::Arc;
use tracing::info;

/// Validated target submission: a menu item points at an internal page or
/// at an external URL, never both, never neither.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSpec {
    Page { page_id: i64 },
    Url { name: String, url: String },
}

impl TargetSpec {
    /// Builds the target from raw form fields. Empty strings count as
    /// absent, matching how admin forms submit untouched inputs.
    pub fn from_parts(
        page_id: Option<i64>,
        url: Option<String>,
        url_name: Option<String>,
    ) -> Result<Self, ApiError> {
        let url = url.filter(|s| !s.trim().is_empty());
        let url_name = url_name.filter(|s| !s.trim().is_empty());

        match (page_id, url) {
            (Some(_), Some(_)) => Err(ApiError::Validation(
                "a menu item points at a page or an external url, not both".to_string(),
            )),
            (Some(page_id), None) => Ok(TargetSpec::Page { page_id }),
            (None, Some(url)) => {
                let name = url_name.ok_or_else(|| {
                    ApiError::Validation("an external url needs a caption".to_string())
                })?;
                Ok(TargetSpec::Url { name, url })
            }
            (None, None) => Err(ApiError::Validation(
                "a menu item needs a page or an external url".to_string(),
            )),
        }
    }
}

pub struct MenuService {
    repository: Arc<Repository>,
}

impl MenuService {
    pub fn new(repository: Arc<Repository>) -> Self {
        Self { repository }
    }

    // ---- menus -------------------------------------------------------

    pub async fn create_menu(&self, name: &str) -> Result<Menu, ApiError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ApiError::Validation("menu name must not be empty".to_string()));
        }

        let menu = self.repository.create_menu(name).await.map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::Validation(format!("menu name already exists: {}", name))
            } else {
                ApiError::DatabaseError(e.to_string())
            }
        })?;

        info!("Created menu {} ({})", menu.name, menu.id);
        Ok(menu)
    }

    pub async fn list_menus(&self) -> Result<Vec<Menu>, ApiError> {
        self.repository.list_menus().await.map_err(db_err)
    }

    pub async fn delete_menu(&self, id: i64) -> Result<(), ApiError> {
        if !self.repository.delete_menu(id).await.map_err(db_err)? {
            return Err(ApiError::NotFound(format!("menu {} does not exist", id)));
        }
        info!("Deleted menu {} and its items", id);
        Ok(())
    }

    // ---- menu items --------------------------------------------------

    pub async fn list_items(&self, menu_id: Option<i64>) -> Result<Vec<MenuItem>, ApiError> {
        self.repository.list_items(menu_id).await.map_err(db_err)
    }

    /// Items of a named menu in display order, for consumption by the
    /// public navigation renderer.
    pub async fn items_for_menu_name(&self, name: &str) -> Result<(Menu, Vec<MenuItem>), ApiError> {
        let menu = self
            .repository
            .find_menu_by_name(name)
            .await
            .map_err(db_err)?
            .ok_or_else(|| ApiError::NotFound(format!("menu {} does not exist", name)))?;

        let items = self
            .repository
            .list_items(Some(menu.id))
            .await
            .map_err(db_err)?;

        Ok((menu, items))
    }

    pub async fn create_item(
        &self,
        menu_id: i64,
        name: Option<String>,
        target: TargetSpec,
    ) -> Result<MenuItem, ApiError> {
        self.require_menu(menu_id).await?;
        let (page_id, url_item_id) = self.resolve_target(target).await?;

        let item = self
            .repository
            .insert_item(menu_id, normalize(&name), page_id, url_item_id)
            .await
            .map_err(db_err)?;

        info!(
            "Created menu item {} in menu {} at rank {}",
            item.id, item.menu_id, item.rank
        );
        Ok(item)
    }

    pub async fn update_item(
        &self,
        id: i64,
        menu_id: i64,
        name: Option<String>,
        target: TargetSpec,
    ) -> Result<MenuItem, ApiError> {
        self.require_menu(menu_id).await?;
        let (page_id, url_item_id) = self.resolve_target(target).await?;

        self.repository
            .update_item(id, menu_id, normalize(&name), page_id, url_item_id)
            .await
            .map_err(db_err)?
            .ok_or_else(|| ApiError::NotFound(format!("menu item {} does not exist", id)))
    }

    pub async fn delete_item(&self, id: i64) -> Result<(), ApiError> {
        if !self.repository.delete_item(id).await.map_err(db_err)? {
            return Err(ApiError::NotFound(format!("menu item {} does not exist", id)));
        }
        Ok(())
    }

    // ---- url items ---------------------------------------------------

    pub async fn list_url_items(&self) -> Result<Vec<UrlItem>, ApiError> {
        self.repository.list_url_items().await.map_err(db_err)
    }

    pub async fn create_url_item(&self, name: &str, url: &str) -> Result<UrlItem, ApiError> {
        validate_url_fields(name, url)?;
        self.repository
            .find_or_create_url_item(name.trim(), url.trim())
            .await
            .map_err(db_err)
    }

    pub async fn update_url_item(&self, id: i64, name: &str, url: &str) -> Result<UrlItem, ApiError> {
        validate_url_fields(name, url)?;
        self.repository
            .update_url_item(id, name.trim(), url.trim())
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    ApiError::Validation(format!("url item already exists: {} {}", name, url))
                } else {
                    ApiError::DatabaseError(e.to_string())
                }
            })?
            .ok_or_else(|| ApiError::NotFound(format!("url item {} does not exist", id)))
    }

    pub async fn delete_url_item(&self, id: i64) -> Result<(), ApiError> {
        let deleted = self.repository.delete_url_item(id).await.map_err(|e| {
            if is_fk_violation(&e) {
                ApiError::Validation(format!(
                    "url item {} is still referenced by menu items",
                    id
                ))
            } else {
                ApiError::DatabaseError(e.to_string())
            }
        })?;

        if !deleted {
            return Err(ApiError::NotFound(format!("url item {} does not exist", id)));
        }
        Ok(())
    }

    // ---- helpers -----------------------------------------------------

    async fn require_menu(&self, menu_id: i64) -> Result<(), ApiError> {
        self.repository
            .find_menu(menu_id)
            .await
            .map_err(db_err)?
            .ok_or_else(|| ApiError::Validation(format!("menu {} does not exist", menu_id)))?;
        Ok(())
    }

    /// Turns a validated target into the pair of nullable FK columns the
    /// schema stores.
    async fn resolve_target(
        &self,
        target: TargetSpec,
    ) -> Result<(Option<i64>, Option<i64>), ApiError> {
        match target {
            TargetSpec::Page { page_id } => {
                self.repository
                    .find_page(page_id)
                    .await
                    .map_err(db_err)?
                    .ok_or_else(|| {
                        ApiError::Validation(format!("page {} does not exist", page_id))
                    })?;
                Ok((Some(page_id), None))
            }
            TargetSpec::Url { name, url } => {
                let url_item = self
                    .repository
                    .find_or_create_url_item(&name, &url)
                    .await
                    .map_err(db_err)?;
                Ok((None, Some(url_item.id)))
            }
        }
    }
}

fn normalize(name: &Option<String>) -> Option<&str> {
    name.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn validate_url_fields(name: &str, url: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() || url.trim().is_empty() {
        return Err(ApiError::Validation(
            "url item needs both a name and a url".to_string(),
        ));
    }
    Ok(())
}

fn db_err(err: anyhow::Error) -> ApiError {
    ApiError::DatabaseError(err.to_string())
}

fn is_unique_violation(err: &anyhow::Error) -> bool {
    let msg = err.to_string();
    msg.contains("unique") || msg.contains("duplicate")
}

fn is_fk_violation(err: &anyhow::Error) -> bool {
    let msg = err.to_string();
    msg.contains("foreign key") || msg.contains("violates")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_target() {
        let spec = TargetSpec::from_parts(Some(7), None, None).unwrap();
        assert_eq!(spec, TargetSpec::Page { page_id: 7 });
    }

    #[test]
    fn test_url_target() {
        let spec = TargetSpec::from_parts(
            None,
            Some("https://example.com".to_string()),
            Some("External Site".to_string()),
        )
        .unwrap();
        assert_eq!(
            spec,
            TargetSpec::Url {
                name: "External Site".to_string(),
                url: "https://example.com".to_string(),
            }
        );
    }

    #[test]
    fn test_both_targets_rejected() {
        let err = TargetSpec::from_parts(
            Some(7),
            Some("https://example.com".to_string()),
            Some("External Site".to_string()),
        )
        .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn test_neither_target_rejected() {
        let err = TargetSpec::from_parts(None, None, None).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn test_blank_url_counts_as_absent() {
        // An untouched form submits "", which must not mask a page target.
        let spec = TargetSpec::from_parts(Some(7), Some("  ".to_string()), None).unwrap();
        assert_eq!(spec, TargetSpec::Page { page_id: 7 });
    }

    #[test]
    fn test_url_without_caption_rejected() {
        let err =
            TargetSpec::from_parts(None, Some("https://example.com".to_string()), None)
                .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }
}
