pub mod api;
pub mod app;
pub mod config;
pub mod entities;
pub mod error;
pub mod metrics;
pub mod migrator;
pub mod notifications;
pub mod pagination;
pub mod permissions;
pub mod repository;
pub mod services;
pub mod specification;
pub mod telemetry;

pub use sea_orm;
