// src/main.rs

use axum::{
    Router,
    middleware as axum_middleware,
    routing::{get, post, put},
};
use tokio::net::TcpListener;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::AppState;
use crate::middleware::auth::auth_guard;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_target(false).compact().init();

    let app_state = AppState::new()
        .await
        .expect("Falló la inicialización del estado de la aplicación.");

    // Corre las migraciones embebidas al arrancar.
    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .expect("Fallaron las migraciones de la base de datos.");

    tracing::info!("Migraciones de la base de datos ejecutadas");

    // Rutas públicas de autenticación
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login));

    let user_routes = Router::new()
        .route("/me", get(handlers::auth::get_me))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let catalog_routes = Router::new()
        .route("/products", get(handlers::catalog::list_products))
        .route("/warehouses", get(handlers::catalog::list_warehouses))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Auditorías de stock: registro, armado, conteo, conciliación y export.
    let audit_routes = Router::new()
        .route(
            "/",
            get(handlers::audits::list_sessions).post(handlers::audits::create_session),
        )
        .route(
            "/{id}",
            axum::routing::delete(handlers::audits::delete_session),
        )
        .route("/{id}/items", get(handlers::audits::get_session_items))
        .route(
            "/{id}/items/{item_id}/count",
            put(handlers::audits::save_count),
        )
        .route(
            "/{id}/items/{item_id}/correction",
            put(handlers::audits::set_correction),
        )
        .route("/{id}/close", post(handlers::audits::close_session))
        .route("/{id}/export", get(handlers::audits::export_session))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let inventory_routes = Router::new()
        .route("/transfers", post(handlers::transfers::create_transfer))
        .route("/movements", get(handlers::transfers::list_movements))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes)
        .nest("/api/users", user_routes)
        .nest("/api/catalog", catalog_routes)
        .nest("/api/audits", audit_routes)
        .nest("/api/inventory", inventory_routes)
        .merge(
            SwaggerUi::new("/docs").url("/api-docs/openapi.json", docs::ApiDoc::openapi()),
        )
        .with_state(app_state);

    let addr = "0.0.0.0:3000";
    let listener = TcpListener::bind(addr)
        .await
        .expect("Falló el bind del listener TCP");
    tracing::info!("Servidor escuchando en {}", addr);
    axum::serve(listener, app)
        .await
        .expect("Error en el servidor Axum");
}
