//! Token minting and verification.
//!
//! [`UrlTokenFactory`] mints tokens whose target URL carries the token hash in
//! the `payum_token` query parameter. [`GatewayTokenFactory`] builds on it to
//! mint the tokens of each gateway action, and [`HttpRequestVerifier`] finds
//! the token an incoming request carries.
mod factory;
mod gateway;
mod query;
mod verifier;

pub use factory::TokenFactory;
pub use factory::TokenRequest;
pub use factory::UrlTokenFactory;
pub use gateway::GatewayTokenFactory;
pub use gateway::TokenPaths;
pub use query::PlainUrlGenerator;
pub use query::QueryParams;
pub use query::UrlGenerator;
pub use query::TOKEN_PARAMETER;
pub use verifier::HttpRequestVerifier;

#[cfg(test)]
pub use factory::MockTokenFactory;
#[cfg(test)]
pub use query::MockUrlGenerator;
