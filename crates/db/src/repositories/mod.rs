//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod order_repo;
pub mod session_repo;

pub use order_repo::OrderRepo;
pub use session_repo::SessionRepo;
