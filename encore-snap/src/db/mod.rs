//! Database access layer for encore-snap
//!
//! Queries against the tables created by `encore_common::db::init_schema`.

pub mod artists;
pub mod seasons;
pub mod snapshots;
