//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - The `Deserialize` request DTO accepted by the HTTP surface
//! - The insert DTO handed to the store

pub mod order;
pub mod session;
