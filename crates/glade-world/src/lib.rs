//! Grid, entity registry, and object registry for the Glade world runtime.
//!
//! This crate owns the authoritative [`World`] aggregate: the sparse tile
//! map with its default-tile policy, the entity registry with its position
//! index, the object registry with its per-position sets, and the tick
//! counter. Mutation is reserved for the single-threaded resolution core;
//! readers elsewhere work from cloned snapshots.
//!
//! # Modules
//!
//! - [`error`] — [`WorldError`] for every fallible operation
//! - [`tiles`] — [`TileMap`], sparse storage with default and sentinel tiles
//! - [`world`] — The [`World`] aggregate, its mutators, and the invariant
//!   checker

pub mod error;
pub mod tiles;
pub mod world;

pub use error::WorldError;
pub use tiles::TileMap;
pub use world::World;
