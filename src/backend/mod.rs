pub mod auth;
pub mod client;
pub mod store;

pub use auth::{AuthApi, NewAccount};
pub use client::{AuthSession, AuthUser, BackendClient};
pub use store::Store;
