pub mod audit_service;
pub mod auth;
pub mod report_service;
pub mod transfer_service;
