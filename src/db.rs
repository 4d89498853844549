pub mod audit_repo;
pub use audit_repo::AuditRepository;
pub mod catalog_repo;
pub use catalog_repo::CatalogRepository;
pub mod transfer_repo;
pub use transfer_repo::TransferRepository;
pub mod user_repo;
pub use user_repo::UserRepository;
