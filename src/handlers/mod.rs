pub mod audits;
pub mod auth;
pub mod catalog;
pub mod transfers;
