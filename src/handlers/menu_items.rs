//! Admin endpoints for menu items: the list view with its computed
//! columns, CRUD, and the two move links.

use crate::database::MenuItem;
use crate::security::{Actor, ChangeGuard};
use crate::services::{MenuService, RankedListManager, TargetSpec};
use crate::utils::error::ApiError;
use axum::{
    extract::{Extension, Path, Query},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

pub const MENU_ITEM_LIST_PATH: &str = "/admin/menuitem/";

#[derive(Debug, Deserialize)]
pub struct ListItemsQuery {
    pub menu_id: Option<i64>,
}

/// One row of the admin list view: effective caption, resolved target
/// name, and the move links, as the admin screen renders them.
#[derive(Debug, Serialize)]
pub struct MenuItemView {
    pub id: i64,
    pub menu_id: i64,
    pub caption: String,
    pub target: String,
    pub rank: i32,
    pub move_up: String,
    pub move_down: String,
}

impl From<MenuItem> for MenuItemView {
    fn from(item: MenuItem) -> Self {
        MenuItemView {
            caption: item.effective_name(),
            target: item.target.name(),
            move_up: format!("{}{}/move_up/", MENU_ITEM_LIST_PATH, item.id),
            move_down: format!("{}{}/move_down/", MENU_ITEM_LIST_PATH, item.id),
            id: item.id,
            menu_id: item.menu_id,
            rank: item.rank,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListItemsResponse {
    pub items: Vec<MenuItemView>,
    pub total: usize,
}

/// Create/edit payload. `page_id` and `url`/`url_name` are mutually
/// exclusive; validation happens in `TargetSpec::from_parts`.
#[derive(Debug, Deserialize)]
pub struct MenuItemRequest {
    pub menu_id: i64,
    pub name: Option<String>,
    pub page_id: Option<i64>,
    pub url: Option<String>,
    pub url_name: Option<String>,
}

pub async fn list_items_handler(
    Extension(menu_service): Extension<Arc<MenuService>>,
    Query(query): Query<ListItemsQuery>,
) -> Result<Json<ListItemsResponse>, ApiError> {
    let items = menu_service.list_items(query.menu_id).await?;
    let items: Vec<MenuItemView> = items.into_iter().map(MenuItemView::from).collect();
    let total = items.len();

    Ok(Json(ListItemsResponse { items, total }))
}

pub async fn create_item_handler(
    Extension(guard): Extension<Arc<ChangeGuard>>,
    Extension(menu_service): Extension<Arc<MenuService>>,
    headers: HeaderMap,
    Json(request): Json<MenuItemRequest>,
) -> Result<(StatusCode, Json<MenuItemView>), ApiError> {
    let actor = Actor::from_headers(&headers)?;
    guard.require_change(&actor)?;

    let target = TargetSpec::from_parts(request.page_id, request.url, request.url_name)?;
    let item = menu_service
        .create_item(request.menu_id, request.name, target)
        .await?;

    Ok((StatusCode::CREATED, Json(item.into())))
}

pub async fn update_item_handler(
    Extension(guard): Extension<Arc<ChangeGuard>>,
    Extension(menu_service): Extension<Arc<MenuService>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(request): Json<MenuItemRequest>,
) -> Result<Json<MenuItemView>, ApiError> {
    let actor = Actor::from_headers(&headers)?;
    guard.require_change(&actor)?;

    let target = TargetSpec::from_parts(request.page_id, request.url, request.url_name)?;
    let item = menu_service
        .update_item(id, request.menu_id, request.name, target)
        .await?;

    Ok(Json(item.into()))
}

pub async fn delete_item_handler(
    Extension(guard): Extension<Arc<ChangeGuard>>,
    Extension(menu_service): Extension<Arc<MenuService>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let actor = Actor::from_headers(&headers)?;
    guard.require_change(&actor)?;

    menu_service.delete_item(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /admin/menuitem/{id}/move_up/ — moves the item one place earlier
/// and sends the browser back to the list.
pub async fn move_up_handler(
    Extension(guard): Extension<Arc<ChangeGuard>>,
    Extension(ranking): Extension<Arc<RankedListManager>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let actor = Actor::from_headers(&headers)?;
    guard.require_change(&actor)?;

    info!("Actor {} moves menu item {} up", actor.name(), id);
    ranking.decrease_rank(id).await?;

    Ok(redirect_to_list())
}

/// GET /admin/menuitem/{id}/move_down/ — moves the item one place later
/// and sends the browser back to the list.
pub async fn move_down_handler(
    Extension(guard): Extension<Arc<ChangeGuard>>,
    Extension(ranking): Extension<Arc<RankedListManager>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let actor = Actor::from_headers(&headers)?;
    guard.require_change(&actor)?;

    info!("Actor {} moves menu item {} down", actor.name(), id);
    ranking.increase_rank(id).await?;

    Ok(redirect_to_list())
}

// 302, as the admin framework expects after a list-row action. axum's
// Redirect only offers 303/307/308.
fn redirect_to_list() -> Response {
    (
        StatusCode::FOUND,
        [(header::LOCATION, MENU_ITEM_LIST_PATH)],
    )
        .into_response()
}
