use sqlx::{PgPool, postgres::PgPoolOptions};
use std::{env, time::Duration};

use crate::{
    db::{AuditRepository, CatalogRepository, TransferRepository, UserRepository},
    services::{
        audit_service::AuditService, auth::AuthService, report_service::ReportService,
        transfer_service::TransferService,
    },
};

// Qué hacer cuando un conteo llega con texto no numérico. El sistema madre
// lo ignoraba en silencio; acá el default es rechazar con mensaje, que es
// lo auditable. AUDIT_COUNT_POLICY=ignore recupera el comportamiento viejo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountInputPolicy {
    Reject,
    Ignore,
}

impl CountInputPolicy {
    fn from_env() -> Self {
        match env::var("AUDIT_COUNT_POLICY").as_deref() {
            Ok("ignore") => CountInputPolicy::Ignore,
            _ => CountInputPolicy::Reject,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub auth_service: AuthService,
    pub catalog_repo: CatalogRepository,
    pub audit_service: AuditService,
    pub report_service: ReportService,
    pub transfer_service: TransferService,
    pub transfer_repo: TransferRepository,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL debe estar definida"))?;
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET debe estar definido"))?;
        let count_policy = CountInputPolicy::from_env();

        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_url)
            .await?;

        tracing::info!("Conexión con la base de datos establecida");

        // Grafo de dependencias: repos -> servicios.
        let user_repo = UserRepository::new(db_pool.clone());
        let catalog_repo = CatalogRepository::new(db_pool.clone());
        let audit_repo = AuditRepository::new(db_pool.clone());
        let transfer_repo = TransferRepository::new(db_pool.clone());

        let auth_service = AuthService::new(user_repo, jwt_secret);
        let audit_service = AuditService::new(
            audit_repo,
            catalog_repo.clone(),
            db_pool.clone(),
            count_policy,
        );
        let transfer_service = TransferService::new(
            catalog_repo.clone(),
            transfer_repo.clone(),
            db_pool.clone(),
        );

        Ok(Self {
            db_pool,
            auth_service,
            catalog_repo,
            audit_service,
            report_service: ReportService::new(),
            transfer_service,
            transfer_repo,
        })
    }
}
