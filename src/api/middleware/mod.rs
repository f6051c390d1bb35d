//! Middleware components for request processing.
//!
//! Request ids, request logging, bearer authentication, and the
//! `AppError` to HTTP response mapping.

mod auth;
mod error_handler;
mod logging;
mod request_id;

pub use auth::{FORBIDDEN_MESSAGE, auth_middleware};
pub use logging::logging_middleware;
pub use request_id::{REQUEST_ID_HEADER, RequestId, request_id_middleware};
