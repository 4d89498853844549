pub mod audit;
pub mod auth;
pub mod catalog;
pub mod transfer;
