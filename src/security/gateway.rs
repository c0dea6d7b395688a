//! Tokens for the gateway actions: capture, authorize, refund, cancel, payout,
//! notify and sync.
//!
//! Actions that send the user somewhere (capture, authorize, ...) are minted as
//! a pair. An "after" token is created first for the page the user returns
//! to, and its target URL becomes the after URL of the action token, so the
//! return page receives a token of its own.
use serde::Deserialize;
use typed_builder::TypedBuilder;

use super::factory::{TokenFactory, TokenRequest};
use super::query::QueryParams;
use crate::domain::{Details, Token, TokenError};

/// Route used as target path for each action.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, TypedBuilder)]
#[serde(default)]
pub struct TokenPaths {
    #[builder(default = "payum_capture_do".to_string(), setter(into))]
    pub capture: String,
    #[builder(default = "payum_authorize_do".to_string(), setter(into))]
    pub authorize: String,
    #[builder(default = "payum_refund_do".to_string(), setter(into))]
    pub refund: String,
    #[builder(default = "payum_cancel_do".to_string(), setter(into))]
    pub cancel: String,
    #[builder(default = "payum_payout_do".to_string(), setter(into))]
    pub payout: String,
    #[builder(default = "payum_notify_do".to_string(), setter(into))]
    pub notify: String,
    #[builder(default = "payum_sync_do".to_string(), setter(into))]
    pub sync: String,
}

impl Default for TokenPaths {
    fn default() -> Self {
        TokenPaths::builder().build()
    }
}

/// Wraps a token factory with the per-action routes.
#[derive(Debug)]
pub struct GatewayTokenFactory<F> {
    factory: F,
    paths: TokenPaths,
}

impl<F: TokenFactory> GatewayTokenFactory<F> {
    /// Creates a new `GatewayTokenFactory`.
    ///
    /// # Arguments
    ///
    /// * `factory` - Mints every token of the chain.
    /// * `paths` - The route each action token targets.
    pub fn new(factory: F, paths: TokenPaths) -> Self {
        GatewayTokenFactory { factory, paths }
    }

    pub fn paths(&self) -> &TokenPaths {
        &self.paths
    }

    /// Creates a capture token and the after token it returns to.
    ///
    /// # Arguments
    ///
    /// * `payment_name` - The payment the tokens are minted for.
    /// * `details` - The model, or its identity, the tokens are bound to.
    /// * `after_path` - Where the user returns once the capture is done.
    /// * `after_parameters` - Query parameters merged into `after_path`.
    ///
    /// # Returns
    ///
    /// Returns the capture token, whose after URL is the after token's target
    /// URL, otherwise the `TokenError` of the first failing step.
    pub fn create_capture_token(
        &self,
        payment_name: &str,
        details: Option<Details>,
        after_path: &str,
        after_parameters: QueryParams,
    ) -> Result<Token, TokenError> {
        self.create_action_token(
            &self.paths.capture,
            payment_name,
            details,
            Some((after_path, after_parameters)),
        )
    }

    /// Creates an authorize token and the after token it returns to.
    ///
    /// Arguments and result are those of [`GatewayTokenFactory::create_capture_token`].
    pub fn create_authorize_token(
        &self,
        payment_name: &str,
        details: Option<Details>,
        after_path: &str,
        after_parameters: QueryParams,
    ) -> Result<Token, TokenError> {
        self.create_action_token(
            &self.paths.authorize,
            payment_name,
            details,
            Some((after_path, after_parameters)),
        )
    }

    /// Creates a refund token.
    ///
    /// # Arguments
    ///
    /// * `payment_name` - The payment the token is minted for.
    /// * `details` - The model, or its identity, the token is bound to.
    /// * `after` - Optional after path and its query parameters. When given,
    ///   an after token is minted first and becomes the refund's after URL.
    ///
    /// # Returns
    ///
    /// Returns the refund token, otherwise the `TokenError` of the first
    /// failing step.
    pub fn create_refund_token(
        &self,
        payment_name: &str,
        details: Option<Details>,
        after: Option<(&str, QueryParams)>,
    ) -> Result<Token, TokenError> {
        self.create_action_token(&self.paths.refund, payment_name, details, after)
    }

    /// Creates a cancel token, like [`GatewayTokenFactory::create_refund_token`].
    pub fn create_cancel_token(
        &self,
        payment_name: &str,
        details: Option<Details>,
        after: Option<(&str, QueryParams)>,
    ) -> Result<Token, TokenError> {
        self.create_action_token(&self.paths.cancel, payment_name, details, after)
    }

    /// Creates a payout token, like [`GatewayTokenFactory::create_refund_token`].
    pub fn create_payout_token(
        &self,
        payment_name: &str,
        details: Option<Details>,
        after: Option<(&str, QueryParams)>,
    ) -> Result<Token, TokenError> {
        self.create_action_token(&self.paths.payout, payment_name, details, after)
    }

    /// Creates a notify token. Notifications come from the gateway, so there
    /// is no after URL.
    pub fn create_notify_token(
        &self,
        payment_name: &str,
        details: Option<Details>,
    ) -> Result<Token, TokenError> {
        self.create_action_token(&self.paths.notify, payment_name, details, None)
    }

    /// Creates a sync token, without after URL.
    pub fn create_sync_token(
        &self,
        payment_name: &str,
        details: Option<Details>,
    ) -> Result<Token, TokenError> {
        self.create_action_token(&self.paths.sync, payment_name, details, None)
    }

    fn create_action_token(
        &self,
        action_path: &str,
        payment_name: &str,
        details: Option<Details>,
        after: Option<(&str, QueryParams)>,
    ) -> Result<Token, TokenError> {
        let after_url = match after {
            Some((after_path, after_parameters)) => {
                let after_token = self.factory.create_token(token_request(
                    payment_name,
                    details.clone(),
                    after_path,
                    after_parameters,
                    None,
                ))?;
                Some(after_token.target_url().to_string())
            }
            None => None,
        };

        self.factory.create_token(token_request(
            payment_name,
            details,
            action_path,
            QueryParams::new(),
            after_url,
        ))
    }
}

fn token_request(
    payment_name: &str,
    details: Option<Details>,
    target_path: &str,
    target_parameters: QueryParams,
    after_path: Option<String>,
) -> TokenRequest {
    let builder = TokenRequest::builder()
        .payment_name(payment_name)
        .target_path(target_path)
        .target_parameters(target_parameters);
    match (details, after_path) {
        (Some(details), Some(after_path)) => {
            builder.details(details).after_path(after_path).build()
        }
        (Some(details), None) => builder.details(details).build(),
        (None, Some(after_path)) => builder.after_path(after_path).build(),
        (None, None) => builder.build(),
    }
}

impl<F: TokenFactory> TokenFactory for GatewayTokenFactory<F> {
    fn create_token(&self, request: TokenRequest) -> Result<Token, TokenError> {
        self.factory.create_token(request)
    }
}
