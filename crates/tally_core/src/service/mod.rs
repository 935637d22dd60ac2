//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls and engine evaluation into use-case APIs.
//! - Keep FFI layers decoupled from storage details.

pub mod habit_service;
