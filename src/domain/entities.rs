use std::fmt;
use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Lightweight reference to a persisted domain object, independent of the
/// storage technology holding it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(test, derive(fake::Dummy))]
pub struct Identity {
    id: String,
    class: String,
}

impl Identity {
    pub fn new(id: impl Into<String>, class: impl Into<String>) -> Self {
        Identity {
            id: id.into(),
            class: class.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn class(&self) -> &str {
        &self.class
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.class, self.id)
    }
}

/// A domain object a token can be bound to.
///
/// The model class is the key storage registries select storages by, and the
/// class recorded in the resulting [`Identity`].
pub trait Model: fmt::Debug + Send + Sync {
    fn model_class(&self) -> &str;
}

/// What a token is minted for: a raw model still to be identified, or an
/// identity resolved beforehand.
#[derive(Debug, Clone)]
pub enum Details {
    Identity(Identity),
    Model(Arc<dyn Model>),
}

impl From<Identity> for Details {
    fn from(identity: Identity) -> Self {
        Details::Identity(identity)
    }
}

impl From<Arc<dyn Model>> for Details {
    fn from(model: Arc<dyn Model>) -> Self {
        Details::Model(model)
    }
}

/// Security token correlating a redirect URL with a payment model.
///
/// The hash is generated once on construction and never changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    hash: String,
    payment_name: String,
    details: Option<Identity>,
    target_url: String,
    after_url: Option<String>,
}

impl Token {
    pub fn new() -> Self {
        Token {
            hash: generate_hash(),
            payment_name: String::new(),
            details: None,
            target_url: String::new(),
            after_url: None,
        }
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn payment_name(&self) -> &str {
        &self.payment_name
    }

    pub fn details(&self) -> Option<&Identity> {
        self.details.as_ref()
    }

    pub fn target_url(&self) -> &str {
        &self.target_url
    }

    pub fn after_url(&self) -> Option<&str> {
        self.after_url.as_deref()
    }

    pub fn set_payment_name(&mut self, payment_name: impl Into<String>) {
        self.payment_name = payment_name.into();
    }

    pub fn set_details(&mut self, details: Option<Identity>) {
        self.details = details;
    }

    pub fn set_target_url(&mut self, target_url: impl Into<String>) {
        self.target_url = target_url.into();
    }

    pub fn set_after_url(&mut self, after_url: Option<String>) {
        self.after_url = after_url;
    }
}

impl Default for Token {
    fn default() -> Self {
        Self::new()
    }
}

/// 32 random bytes, URL-safe base64 without padding, so the hash never needs
/// escaping inside a query string.
fn generate_hash() -> String {
    let bytes: [u8; 32] = rand::thread_rng().gen();
    URL_SAFE_NO_PAD.encode(bytes)
}
