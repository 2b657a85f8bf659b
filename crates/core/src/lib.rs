//! Domain logic for the ridepool trip-matching backend.
//!
//! This crate has zero internal dependencies so the db and api layers can
//! both consume it. It owns the track/participant lifecycle state machines,
//! the proximity ranking used for trip discovery, and the validation rules
//! shared across layers.

pub mod error;
pub mod lifecycle;
pub mod phone;
pub mod proximity;
pub mod roles;
pub mod tracks;
pub mod types;
