pub mod account;
pub mod auth;
pub mod configuration;
pub mod error;
pub mod notify;
pub mod service;
pub mod store;
pub mod telemetry;
pub mod validators;
