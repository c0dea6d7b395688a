#![warn(rust_2018_idioms, missing_debug_implementations)]
mod domain;
pub mod security;
mod storage;

pub use crate::domain::*;
pub use crate::security::*;
pub use crate::storage::*;
