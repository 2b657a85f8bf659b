//! Response envelope.

use serde::Serialize;

/// The `{ "data": ... }` wrapper every successful JSON response uses.
/// Typed rather than assembled with `json!` so the payload shape is
/// checked at compile time.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
