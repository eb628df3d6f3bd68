//! services/api/src/lib.rs
//!
//! HTTP service for the book tracker: adapters for Postgres, external
//! catalogs and the identity provider, the application services and the
//! axum web layer.

pub mod adapters;
pub mod config;
pub mod error;
pub mod service;
pub mod web;
