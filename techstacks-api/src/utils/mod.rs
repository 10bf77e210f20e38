//! Shared helpers for the API layer.

pub mod markdown;

pub use markdown::{escape_html, DetailsRenderer, MarkdownRenderer};
