//! Query parameter types shared across handler modules.

use serde::Deserialize;

/// `?limit=&offset=` for the listing endpoints. The repository layer
/// clamps out-of-range values.
#[derive(Debug, Deserialize)]
pub struct PaginationParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Query parameters for `GET /tracks/search`.
///
/// `s_x`/`s_y` are the rider's start point, `e_x`/`e_y` the destination.
/// `ipp` is items per page; `page` is zero-based.
#[derive(Debug, Deserialize)]
pub struct TrackSearchParams {
    pub s_x: f64,
    pub s_y: f64,
    pub e_x: f64,
    pub e_y: f64,
    pub page: Option<u32>,
    pub ipp: Option<u32>,
}
