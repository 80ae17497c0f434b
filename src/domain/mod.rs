//! Document model, format detection and the text helpers shared by every pass.

pub mod anchor;
pub mod document;
pub mod error;
pub mod format;
pub mod markup;
