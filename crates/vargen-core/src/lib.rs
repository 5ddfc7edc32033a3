//! Vargen Core Library
//!
//! Type descriptors, the embedded metadata codec, identifier rules and
//! project settings for the variable type generator.

pub mod config;
pub mod descriptor;
pub mod error;
pub mod identifier;

pub use config::Settings;
pub use descriptor::{Referability, TypeDescriptor};
pub use error::{ErrorKind, VarTypeError, VarTypeResult};
