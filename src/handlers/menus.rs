use crate::database::{Menu, MenuTarget};
use crate::security::{Actor, ChangeGuard};
use crate::services::MenuService;
use crate::utils::error::ApiError;
use axum::{
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct MenuRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct ListMenusResponse {
    pub menus: Vec<Menu>,
    pub total: usize,
}

pub async fn list_menus_handler(
    Extension(menu_service): Extension<Arc<MenuService>>,
) -> Result<Json<ListMenusResponse>, ApiError> {
    let menus = menu_service.list_menus().await?;
    let total = menus.len();

    Ok(Json(ListMenusResponse { menus, total }))
}

pub async fn create_menu_handler(
    Extension(guard): Extension<Arc<ChangeGuard>>,
    Extension(menu_service): Extension<Arc<MenuService>>,
    headers: HeaderMap,
    Json(request): Json<MenuRequest>,
) -> Result<(StatusCode, Json<Menu>), ApiError> {
    let actor = Actor::from_headers(&headers)?;
    guard.require_change(&actor)?;

    let menu = menu_service.create_menu(&request.name).await?;
    Ok((StatusCode::CREATED, Json(menu)))
}

pub async fn delete_menu_handler(
    Extension(guard): Extension<Arc<ChangeGuard>>,
    Extension(menu_service): Extension<Arc<MenuService>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let actor = Actor::from_headers(&headers)?;
    guard.require_change(&actor)?;

    menu_service.delete_menu(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// One navigation entry as a theme renders it: display text plus the
/// resolved target.
#[derive(Debug, Serialize)]
pub struct NavEntry {
    pub caption: String,
    pub target: MenuTarget,
}

#[derive(Debug, Serialize)]
pub struct MenuItemsResponse {
    pub menu: String,
    pub items: Vec<NavEntry>,
}

/// GET /api/menus/{name}/items — public read path for navigation
/// rendering, items in rank order.
pub async fn menu_items_by_name_handler(
    Extension(menu_service): Extension<Arc<MenuService>>,
    Path(name): Path<String>,
) -> Result<Json<MenuItemsResponse>, ApiError> {
    let (menu, items) = menu_service.items_for_menu_name(&name).await?;

    let items = items
        .into_iter()
        .map(|item| NavEntry {
            caption: item.effective_name(),
            target: item.target,
        })
        .collect();

    Ok(Json(MenuItemsResponse {
        menu: menu.name,
        items,
    }))
}
