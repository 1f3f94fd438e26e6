//! Storage layer for account data.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐
//! │ API handlers │
//! └──────┬───────┘
//!        │  Arc<dyn Store>
//!        ↓
//! ┌──────────────┐        ┌──────────────┐
//! │ PostgresStore│        │ InMemoryStore│
//! └──────┬───────┘        └──────────────┘
//!        │
//!        ↓
//! ┌──────────────┐
//! │ Repositories │  (db::handlers, parameter-bound SQL)
//! └──────┬───────┘
//!        │
//!        ↓
//! ┌──────────────┐
//! │  PostgreSQL  │
//! └──────────────┘
//! ```
//!
//! # Modules
//!
//! - [`store`]: the [`store::Store`] trait the API is written against
//! - [`postgres`]: pooled PostgreSQL backend
//! - [`in_memory`]: process-local backend for development and tests
//! - [`handlers`]: one repository per table
//! - [`models`]: records as they are written to and read from storage
//! - [`errors`]: storage error classification

pub mod errors;
pub mod handlers;
pub mod in_memory;
pub mod models;
pub mod postgres;
pub mod store;
