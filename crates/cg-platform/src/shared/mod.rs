//! Shared infrastructure: errors, credentials, middleware, indexes

pub mod api_common;
pub mod credential;
pub mod error;
pub mod indexes;
pub mod middleware;
