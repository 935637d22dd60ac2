//! Flutter bridge crate for Tally core.

pub mod api;
