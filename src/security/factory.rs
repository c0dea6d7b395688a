use log::debug;
use typed_builder::TypedBuilder;

use super::query::{rewrite_query, QueryParams, UrlGenerator, TOKEN_PARAMETER};
use crate::domain::{Details, Identity, Token, TokenError};
use crate::storage::{StorageRegistry, TokenStorage};

/// Everything needed to mint a token.
#[derive(Debug, Clone, TypedBuilder)]
pub struct TokenRequest {
    #[builder(setter(into))]
    payment_name: String,
    #[builder(default, setter(strip_option, into))]
    details: Option<Details>,
    #[builder(setter(into))]
    target_path: String,
    #[builder(default)]
    target_parameters: QueryParams,
    #[builder(default, setter(strip_option, into))]
    after_path: Option<String>,
    #[builder(default)]
    after_parameters: QueryParams,
}

impl TokenRequest {
    pub fn payment_name(&self) -> &str {
        &self.payment_name
    }

    pub fn details(&self) -> Option<&Details> {
        self.details.as_ref()
    }

    pub fn target_path(&self) -> &str {
        &self.target_path
    }

    pub fn target_parameters(&self) -> &QueryParams {
        &self.target_parameters
    }

    pub fn after_path(&self) -> Option<&str> {
        self.after_path.as_deref()
    }

    pub fn after_parameters(&self) -> &QueryParams {
        &self.after_parameters
    }
}

/// Mints security tokens.
#[cfg_attr(test, mockall::automock)]
pub trait TokenFactory {
    fn create_token(&self, request: TokenRequest) -> Result<Token, TokenError>;
}

/// Token factory binding tokens to URLs.
///
/// The token storage creates and persists tokens, the registry locates the
/// storage able to identify a raw model, and the generator materializes
/// URLs for paths that are not absolute already.
#[derive(Debug)]
pub struct UrlTokenFactory<S, R, G> {
    token_storage: S,
    registry: R,
    generator: G,
}

impl<S, R, G> UrlTokenFactory<S, R, G>
where
    S: TokenStorage,
    R: StorageRegistry,
    G: UrlGenerator,
{
    /// Creates a new `UrlTokenFactory`.
    ///
    /// # Arguments
    ///
    /// * `token_storage` - Creates the tokens and persists them once filled in.
    /// * `registry` - Locates the storage identifying a raw model.
    /// * `generator` - Builds URLs for target and after paths that are not
    ///   absolute http(s) URLs.
    pub fn new(token_storage: S, registry: R, generator: G) -> Self {
        UrlTokenFactory {
            token_storage,
            registry,
            generator,
        }
    }

    pub fn token_storage(&self) -> &S {
        &self.token_storage
    }

    fn identify(&self, details: Option<Details>) -> Result<Option<Identity>, TokenError> {
        match details {
            None => Ok(None),
            Some(Details::Identity(identity)) => Ok(Some(identity)),
            Some(Details::Model(model)) => {
                let storage = self.registry.get_storage(&model)?;
                Ok(Some(storage.identify(&model)?))
            }
        }
    }

    /// The token parameter comes first and always carries `hash`; whatever
    /// the path or the caller set for it is discarded.
    fn target_url(
        &self,
        hash: &str,
        path: &str,
        mut parameters: QueryParams,
    ) -> Result<String, TokenError> {
        parameters.remove(TOKEN_PARAMETER);
        rewrite_query(&self.generator, path, |mut existing| {
            existing.remove(TOKEN_PARAMETER);
            QueryParams::new()
                .with(TOKEN_PARAMETER, hash)
                .merge(&existing)
                .merge(&parameters)
        })
    }

    /// A token parameter already in the path survives unless the caller
    /// overrides or unsets it.
    fn after_url(&self, path: &str, parameters: &QueryParams) -> Result<String, TokenError> {
        rewrite_query(&self.generator, path, |existing| existing.merge(parameters))
    }
}

impl<S, R, G> TokenFactory for UrlTokenFactory<S, R, G>
where
    S: TokenStorage,
    R: StorageRegistry,
    G: UrlGenerator,
{
    /// Mints a token for the given request.
    ///
    /// # Arguments
    ///
    /// * `request` - Payment name, details, target and after paths with their
    ///   query parameters.
    ///
    /// # Returns
    ///
    /// Returns the persisted token, otherwise a `TokenError` from storage,
    /// model identification or URL parsing. Nothing is persisted on error.
    fn create_token(&self, request: TokenRequest) -> Result<Token, TokenError> {
        let TokenRequest {
            payment_name,
            details,
            target_path,
            target_parameters,
            after_path,
            after_parameters,
        } = request;

        let mut token = self.token_storage.create()?;
        token.set_payment_name(payment_name);
        token.set_details(self.identify(details)?);

        let target_url = self.target_url(token.hash(), &target_path, target_parameters)?;
        token.set_target_url(target_url);

        let after_url = match after_path {
            Some(path) => Some(self.after_url(&path, &after_parameters)?),
            None => None,
        };
        token.set_after_url(after_url);

        self.token_storage.update(&token)?;
        debug!(
            "Created token {} for payment {} targeting {}",
            token.hash(),
            token.payment_name(),
            token.target_url()
        );
        Ok(token)
    }
}
