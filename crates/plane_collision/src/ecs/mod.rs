//! Entity identity shared with the surrounding game
//!
//! The collision core does not own entities; it only needs a stable handle
//! to key its registries and to name bodies in hit events.

pub mod entity;

pub use entity::Entity;
