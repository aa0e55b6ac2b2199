//! # Scoring Core
//!
//! Core types for the scoring API:
//!
//! - [`FieldSpec`] / [`FieldKind`] - declarative field validators
//! - [`Schema`] / [`RequestSchema`] - ordered, fail-fast request schemas
//! - [`MethodRequest`], [`OnlineScoreRequest`], [`ClientsInterestsRequest`] - typed requests
//! - [`Authenticator`] - salted SHA-512 token checks
//! - [`ApiError`] - the error every method call can end in
//! - [`RequestContext`] - per-call record used for logging

#![forbid(unsafe_code)]

mod auth;
mod context;
mod error;
pub mod field;
pub mod request;
mod schema;

pub use auth::{
    sha512_hex, AuthContext, Authenticator, DEFAULT_ADMIN_LOGIN, DEFAULT_ADMIN_SALT, DEFAULT_SALT,
};
pub use context::{RequestContext, RequestId};
pub use error::{ApiError, ApiResult, ErrorCategory};
pub use field::{as_integer, FieldError, FieldKind, FieldSpec, Gender};
pub use request::{
    ClientId, ClientsInterestsRequest, MethodRequest, OnlineScoreRequest, CLIENTS_INTERESTS,
    MISSING_PAIRS_MESSAGE, ONLINE_SCORE,
};
pub use schema::{RequestSchema, Schema, SchemaError, ValidatedRequest};
