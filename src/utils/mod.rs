//! Utility modules shared across the generator and the dev server.

pub mod html;
pub mod mime;
pub mod path;
pub mod plural;
pub mod write;
