//! Push-channel protocol.
//!
//! Frames are JSON objects with a required `type` tag. They are parsed once
//! into the [`Event`] sum type; everything downstream matches on variants
//! instead of probing fields.

mod event;
mod parser;
mod types;

pub use event::*;
pub use parser::*;
pub use types::*;
