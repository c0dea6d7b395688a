//! Module that describe domain entities and errors.
mod entities;
mod errors;

pub use entities::Details;
pub use entities::Identity;
pub use entities::Model;
pub use entities::Token;
pub use errors::*;
