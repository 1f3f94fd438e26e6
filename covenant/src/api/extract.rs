//! Request extractors whose rejections render as `{"error": ...}` bodies.
//!
//! axum's own `Json`, `Path` and `Query` reject with plain-text responses. These wrappers
//! route the rejection through [`crate::errors::Error`] instead, so malformed bodies,
//! unparseable ids and bad query strings come back as 400 in the same shape as every
//! other error.

use axum::extract::{FromRequest, FromRequestParts};

use crate::errors::Error;

#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(Error))]
pub struct ApiJson<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(Error))]
pub struct ApiPath<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(Error))]
pub struct ApiQuery<T>(pub T);
