//! Proximity ranking for trip discovery.
//!
//! Candidates are scored by a composite flat-plane distance: how far the
//! track's start point is from the rider's start point, plus how far the
//! track's end point is from the rider's destination. Lower is better. This
//! is a full-scan Euclidean heuristic, not geodesic distance; at the data
//! volumes involved a spatial index would be overkill.

use serde::Serialize;

/// A 2D coordinate pair on the flat plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub x: f64,
    pub y: f64,
}

impl GeoPoint {
    /// Euclidean distance to another point.
    pub fn distance_to(self, other: GeoPoint) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// A start/end point pair, either a track's route or a rider's desired route.
#[derive(Debug, Clone, Copy)]
pub struct Route {
    pub start: GeoPoint,
    pub end: GeoPoint,
}

/// Composite score for ranking: start-to-start plus end-to-end distance.
pub fn total_distance(candidate: Route, query: Route) -> f64 {
    candidate.start.distance_to(query.start) + candidate.end.distance_to(query.end)
}

/// Zero-based page index and page size for a ranked query.
#[derive(Debug, Clone, Copy)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

/// One page of ranked results.
///
/// `total` counts ALL candidates, independent of pagination. `is_more` is
/// true iff candidates exist beyond the end of this page.
#[derive(Debug, Serialize)]
pub struct RankedPage<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub is_more: bool,
}

/// Rank `candidates` by [`total_distance`] against `query` ascending and
/// return the requested page.
///
/// The sort is stable, so candidates with equal scores keep their input
/// order; callers pass candidates in creation order to make ties
/// deterministic across pages.
pub fn rank<T>(
    candidates: Vec<T>,
    query: Route,
    page: PageRequest,
    route_of: impl Fn(&T) -> Route,
) -> RankedPage<T> {
    let total = candidates.len() as u64;

    let mut scored: Vec<(f64, T)> = candidates
        .into_iter()
        .map(|c| (total_distance(route_of(&c), query), c))
        .collect();
    scored.sort_by(|a, b| a.0.total_cmp(&b.0));

    let skip = page.page as usize * page.per_page as usize;
    let items: Vec<T> = scored
        .into_iter()
        .skip(skip)
        .take(page.per_page as usize)
        .map(|(_, c)| c)
        .collect();

    let is_more = total > (skip + items.len()) as u64;

    RankedPage {
        items,
        total,
        is_more,
    }
}
