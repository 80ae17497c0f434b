//! Application services: rendering, conversion, navigation and reading stats.

pub mod convert;
pub mod error;
pub mod reading;
pub mod render;
pub mod toc;
