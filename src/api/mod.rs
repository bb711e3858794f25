//! HTTP API Handlers and Routes
//!
//! # Module Structure
//!
//! - [`api::handlers`](crate::api::handlers) - Request handlers for each endpoint
//! - [`api::routes`](crate::api::routes) - Route definitions and router configuration
//!
//! # Endpoints
//!
//! - `GET /` - Upload form ("Text Analysis System")
//! - `POST /api/ask` - Multipart `file` (optional) and `question`; returns
//!   `{"answer": ..., "retrieved_text": ...}`
//! - `GET /api/health` - Status, vector store provider and current file
//!
//! Requests are served one at a time: `/api/ask` holds the session lock until
//! its ingestion and answer are complete.

/// Request handlers.
pub mod handlers;
/// Router construction.
pub mod routes;
