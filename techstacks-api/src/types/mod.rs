//! API Request and Response Types
//!
//! Request bodies, query parameters and the response projections returned by
//! the REST routes. Catalog entities themselves live in `techstacks-core`.

// Stack types
mod stack;
pub use stack::*;

// Choice and technology types
mod technology;
pub use technology::*;

// Configuration option types
mod config;
pub use config::*;
