//! Token lifecycle management.

pub mod memory;
pub mod service;
pub mod store;

pub use memory::InMemoryTokenStore;
pub use service::{
    CleanupOptions, CleanupReport, IssuedToken, TokenDefaults, TokenOverrides, TokenPolicy,
    TokenService,
};
pub use store::TokenStore;
