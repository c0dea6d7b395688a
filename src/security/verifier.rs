use log::warn;
use url::Url;

use super::query::{path_of, QueryParams, TOKEN_PARAMETER};
use crate::domain::{Token, TokenError};
use crate::storage::TokenStorage;

/// Resolves the token a request carries and invalidates spent tokens.
#[derive(Debug)]
pub struct HttpRequestVerifier<S> {
    token_storage: S,
}

impl<S: TokenStorage> HttpRequestVerifier<S> {
    pub fn new(token_storage: S) -> Self {
        HttpRequestVerifier { token_storage }
    }

    /// Looks up the token named by the request's `payum_token` parameter.
    ///
    /// `request_uri` is either an absolute URL or an origin-form path such as
    /// `/capture?payum_token=...`. The request path must match the path of
    /// the token's target URL.
    pub fn verify(&self, request_uri: &str) -> Result<Token, TokenError> {
        let query = match Url::parse(request_uri) {
            Ok(url) => url.query().unwrap_or("").to_string(),
            Err(_) => request_uri
                .split('#')
                .next()
                .and_then(|rest| rest.split_once('?'))
                .map(|(_, query)| query.to_string())
                .unwrap_or_default(),
        };
        let hash = QueryParams::parse(&query)
            .get(TOKEN_PARAMETER)
            .filter(|hash| !hash.is_empty())
            .map(str::to_string)
            .ok_or(TokenError::TokenParameterMissing)?;

        let token = self
            .token_storage
            .find(&hash)?
            .ok_or_else(|| TokenError::TokenNotFound(hash.clone()))?;

        let request_path = path_of(request_uri);
        let target_path = path_of(token.target_url());
        if request_path != target_path {
            warn!(
                "Token {} used on {} instead of {}",
                hash, request_path, target_path
            );
            return Err(TokenError::UrlMismatch {
                request: request_uri.to_string(),
                target: token.target_url().to_string(),
            });
        }
        Ok(token)
    }

    /// Invalidates the given token. Tokens are single use, so a spent one is
    /// removed from storage.
    ///
    /// # Arguments
    ///
    /// * `token` - The token the request was verified with.
    ///
    /// # Returns
    ///
    /// Returns `Ok(())` once the token is gone, otherwise the storage error
    /// wrapped in a `TokenError`.
    pub fn invalidate(&self, token: &Token) -> Result<(), TokenError> {
        self.token_storage.delete(token)?;
        Ok(())
    }
}
