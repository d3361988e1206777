pub mod credentials;
mod endpoints;
pub mod service;

pub use credentials::{AccessToken, OutlookCredentials};
pub use service::{AccessTokenSource, TokenManager};
