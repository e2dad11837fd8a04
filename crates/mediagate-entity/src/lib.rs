//! # mediagate-entity
//!
//! Domain models for Mediagate. Entities are plain data with light
//! invariant helpers; all mutation goes through the repository and
//! service layers.

pub mod account;
pub mod resource;
pub mod token;
