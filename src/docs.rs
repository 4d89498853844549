// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};

use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::get_me,

        // --- Catalog ---
        handlers::catalog::list_products,
        handlers::catalog::list_warehouses,

        // --- Audits ---
        handlers::audits::list_sessions,
        handlers::audits::create_session,
        handlers::audits::get_session_items,
        handlers::audits::save_count,
        handlers::audits::set_correction,
        handlers::audits::close_session,
        handlers::audits::delete_session,
        handlers::audits::export_session,

        // --- Inventory ---
        handlers::transfers::create_transfer,
        handlers::transfers::list_movements,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::UserRole,
            models::auth::User,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,

            // --- Catalog ---
            models::catalog::WarehouseCode,
            models::catalog::Warehouse,
            models::catalog::MasterProduct,

            // --- Audits ---
            models::audit::SessionStatus,
            models::audit::StockControlSession,
            models::audit::StockControlItem,
            models::audit::StockCount,
            models::audit::CountView,
            models::audit::SessionItemView,
            models::audit::UserProgress,
            models::audit::SessionSummary,

            // --- Inventory ---
            models::transfer::MovementType,
            models::transfer::MovementStatus,
            models::transfer::StockMovement,
            models::transfer::StockMovementView,
            models::transfer::TransferLine,
            models::transfer::TransferReceipt,

            // --- Payloads ---
            handlers::audits::CreateSessionPayload,
            handlers::audits::SessionItemsResponse,
            handlers::audits::SaveCountPayload,
            handlers::audits::SavedCountResponse,
            handlers::audits::CorrectionPayload,
            handlers::transfers::TransferPayload,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticación y registro"),
        (name = "Users", description = "Perfil del usuario"),
        (name = "Catalog", description = "Maestro de artículos y depósitos"),
        (name = "Audits", description = "Auditorías de stock y conciliación"),
        (name = "Inventory", description = "Transferencias y movimientos de stock")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}
