//! `boxer-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives shared by the receiving
//! domain and the infrastructure layer (no IO, no logging setup).

pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use entity::Entity;
pub use error::{FormatError, FormatResult};
pub use id::{BoxId, SupplierId};
pub use value_object::ValueObject;
