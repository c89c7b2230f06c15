//! # MedicalMap Backend Library
//!
//! Core library for MedicalMap, a directory service for medical congresses:
//! spreadsheet import/normalization, a filter/facet/sort query engine over
//! two storage backends, and an email-gated CSV/XLSX export flow behind a
//! REST API.
//!
//! ## Architecture
//!
//! The application is built using:
//! - **Axum**: HTTP server and routing
//! - **SQLx**: Asynchronous database operations with SQLite
//! - **Tokio**: Async runtime
//! - **Serde**: Serialization/deserialization for JSON APIs
//!
//! ## Core Components
//!
//! - [`config`]: Application configuration management
//! - [`db`]: Database schema initialization
//! - [`error`]: Centralized error handling and HTTP error responses
//! - [`export`]: CSV/XLSX export buffer builder
//! - [`ingest`]: Spreadsheet normalization and import pipeline
//! - [`mailer`]: Outbound email delivery client
//! - [`middleware`]: Rate limiting, client IP and security headers
//! - [`query`]: Typed filter parsing and the in-memory query engine
//! - [`routes`]: HTTP API endpoint handlers
//! - [`state`]: Shared application state
//! - [`store`]: The record store contract and its two backends
//! - [`types`]: Data transfer objects and shared type definitions

pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod ingest;
pub mod mailer;
pub mod middleware;
pub mod query;
pub mod routes;
pub mod state;
pub mod store;
pub mod types;

#[cfg(test)]
mod tests;
