//! Identity store account entity.

pub mod model;

pub use model::{Account, SessionEntry};
