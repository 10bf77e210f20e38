//! Custom Axum extractors.

pub mod path_id;

pub use path_id::{PathId, PathIdError, PathIds};
