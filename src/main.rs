use anyhow::Result;
use axum::{
    extract::Extension,
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};
use tracing::info;

use menu_admin_server::config::Settings;
use menu_admin_server::database::{DbPool, RankStore, Repository};
use menu_admin_server::handlers;
use menu_admin_server::security::ChangeGuard;
use menu_admin_server::services::{MenuService, RankedListManager};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,menu_admin_server=debug".to_string()),
        )
        .with_target(true)
        .json()
        .init();

    info!("🚀 Starting Menu Admin Server...");

    // Load configuration
    let settings = Settings::load()?;
    info!("✅ Configuration loaded");

    // Initialize database pool
    let db_pool = DbPool::new(&settings.database).await?;
    info!("✅ Database connection established");

    // Apply schema migrations
    sqlx::migrate!("./migrations").run(db_pool.get_pool()).await?;
    info!("✅ Migrations applied");

    // Initialize repository and services
    let repository = Arc::new(Repository::new(db_pool.clone()));
    let menu_service = Arc::new(MenuService::new(repository.clone()));
    let ranking = Arc::new(RankedListManager::new(
        repository.clone() as Arc<dyn RankStore>,
    ));
    let change_guard = Arc::new(ChangeGuard::new(settings.admin.editors.clone()));

    // Build router
    let app = build_router(db_pool, menu_service, ranking, change_guard);

    // Server address
    let addr = SocketAddr::from((
        settings.server.host.parse::<std::net::IpAddr>()?,
        settings.server.port,
    ));

    info!("🎯 Server listening on {}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_router(
    db_pool: DbPool,
    menu_service: Arc<MenuService>,
    ranking: Arc<RankedListManager>,
    change_guard: Arc<ChangeGuard>,
) -> Router {
    // Public routes (no permission gate)
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/health/ready", get(handlers::health::readiness_check))
        .route(
            "/api/menus/{name}/items",
            get(handlers::menus::menu_items_by_name_handler),
        );

    // Admin routes; mutating handlers check the change guard themselves
    let admin_routes = Router::new()
        .route(
            "/admin/menu/",
            get(handlers::menus::list_menus_handler).post(handlers::menus::create_menu_handler),
        )
        .route(
            "/admin/menu/{id}/",
            axum::routing::delete(handlers::menus::delete_menu_handler),
        )
        .route(
            "/admin/menuitem/",
            get(handlers::menu_items::list_items_handler)
                .post(handlers::menu_items::create_item_handler),
        )
        .route(
            "/admin/menuitem/{id}/",
            axum::routing::put(handlers::menu_items::update_item_handler)
                .delete(handlers::menu_items::delete_item_handler),
        )
        .route(
            "/admin/menuitem/{id}/move_up/",
            get(handlers::menu_items::move_up_handler),
        )
        .route(
            "/admin/menuitem/{id}/move_down/",
            get(handlers::menu_items::move_down_handler),
        )
        .route(
            "/admin/urlitem/",
            get(handlers::url_items::list_url_items_handler)
                .post(handlers::url_items::create_url_item_handler),
        )
        .route(
            "/admin/urlitem/{id}/",
            axum::routing::put(handlers::url_items::update_url_item_handler)
                .delete(handlers::url_items::delete_url_item_handler),
        );

    Router::new()
        .merge(public_routes)
        .merge(admin_routes)
        // Shared state
        .layer(Extension(db_pool))
        .layer(Extension(menu_service))
        .layer(Extension(ranking))
        .layer(Extension(change_guard))
        // CORS
        .layer(CorsLayer::permissive())
        // Tracing
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(false)),
        )
}
