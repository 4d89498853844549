use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

// Error único de la aplicación. Cada variante sabe traducirse a un status
// HTTP y un mensaje para el usuario.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Error de validación")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("El e-mail ya existe")]
    EmailAlreadyExists,

    #[error("Credenciales inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuario no encontrado")]
    UserNotFound,

    #[error("Requiere rol administrador")]
    Forbidden,

    #[error("Auditoría no encontrada")]
    SessionNotFound,

    #[error("La auditoría ya fue cerrada")]
    SessionFinished,

    #[error("Ítem de auditoría no encontrado")]
    ItemNotFound,

    #[error("Artículo {0} no encontrado")]
    ProductNotFound(String),

    #[error("Depósito no encontrado")]
    WarehouseNotFound,

    #[error("Cantidad inválida: {0}")]
    InvalidQuantity(String),

    #[error("Stock insuficiente para {0} en el depósito de origen")]
    InsufficientStock(String),

    #[error("Origen y destino deben ser depósitos distintos")]
    SameWarehouse,

    #[error("Error de base de datos")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Error interno del servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Error de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Error de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("Error generando la planilla: {0}")]
    ReportError(#[from] rust_xlsxwriter::XlsxError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            // Devuelve el detalle completo de la validación, campo por campo.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "Uno o más campos son inválidos.",
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::EmailAlreadyExists => {
                (StatusCode::CONFLICT, "Este e-mail ya está en uso.".to_string())
            }
            AppError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "E-mail o contraseña inválidos.".to_string())
            }
            AppError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "Token de autenticación inválido o ausente.".to_string(),
            ),
            AppError::UserNotFound => {
                (StatusCode::NOT_FOUND, "Usuario no encontrado.".to_string())
            }
            AppError::Forbidden => (
                StatusCode::FORBIDDEN,
                "Esta operación requiere rol administrador.".to_string(),
            ),
            AppError::SessionNotFound => {
                (StatusCode::NOT_FOUND, "Auditoría no encontrada.".to_string())
            }
            AppError::SessionFinished => (
                StatusCode::CONFLICT,
                "La auditoría ya fue cerrada; no admite más cargas.".to_string(),
            ),
            AppError::ItemNotFound => {
                (StatusCode::NOT_FOUND, "Ítem de auditoría no encontrado.".to_string())
            }
            ref e @ AppError::ProductNotFound(_) => (StatusCode::NOT_FOUND, e.to_string()),
            AppError::WarehouseNotFound => {
                (StatusCode::NOT_FOUND, "Depósito no encontrado.".to_string())
            }
            ref e @ AppError::InvalidQuantity(_) => (StatusCode::BAD_REQUEST, e.to_string()),
            ref e @ AppError::InsufficientStock(_) => (StatusCode::CONFLICT, e.to_string()),
            AppError::SameWarehouse => (
                StatusCode::BAD_REQUEST,
                "Origen y destino deben ser depósitos distintos.".to_string(),
            ),

            // Todo lo demás (DatabaseError, InternalServerError, etc.) es 500.
            // El detalle queda en el log, no en la respuesta.
            ref e => {
                tracing::error!("Error interno del servidor: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Ocurrió un error inesperado.".to_string(),
                )
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
