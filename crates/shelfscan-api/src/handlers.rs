//! Request handlers.

pub mod health;
pub mod predict;
pub mod seller;

pub use health::*;
pub use predict::*;
pub use seller::*;
