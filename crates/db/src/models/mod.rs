//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts
//! - A `Serialize` response struct where the row must not leak as-is

pub mod car;
pub mod state;
pub mod track;
pub mod user;
