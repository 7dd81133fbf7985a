//! blynclight: control Embrava BlyncLight USB status lights.

pub mod claims;
pub mod color;
pub mod command;
pub mod config;
pub mod device;
pub mod error;
pub mod light;
pub mod protocol;

pub use color::Color;
pub use command::{CommandWord, Field};
pub use error::BlyncError;
pub use light::{BlyncLight, PausedUpdates};
