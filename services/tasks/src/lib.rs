//! Task tracking service
//!
//! Task CRUD, assignment, comments and filtered listings behind an
//! admin/assignee authorization policy. The engine ([`service::TaskService`])
//! is generic over its [`repositories::TaskStore`] and
//! [`common::users::UserDirectory`], so it runs against PostgreSQL in
//! production and in-memory stores in tests.

pub mod error;
pub mod filter;
pub mod middleware;
pub mod models;
pub mod policy;
pub mod repositories;
pub mod routes;
pub mod service;
pub mod settings;
pub mod state;
