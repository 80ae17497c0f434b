//! Rich-text document handling for stored content in two JSON schemas: a flat
//! block schema and a recursive node schema with structured marks.
//!
//! Every read-side pass (classification, rendering, conversion, TOC
//! extraction and read-time estimation) is a pure function over the decoded
//! document.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
