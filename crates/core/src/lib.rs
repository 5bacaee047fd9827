//! ulevel core - canonical level model and shared error types
//!
//! Every format adapter loads into and saves from the types in this crate:
//! a [`Level`] holding flat lists of [`TileLayer`]s and [`LevelObject`]s,
//! with arbitrary [`Value`] metadata hanging off each of them.

mod error;
mod level;
mod value;

pub use error::*;
pub use level::*;
pub use value::*;
