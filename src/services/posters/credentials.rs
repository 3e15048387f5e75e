//! API credential rotation
//!
//! Credentials are an ordered chain of providers. Each attempt gets the next
//! available key; the chain stops at the first attempt that breaks out with a
//! value.
use std::{fmt, future::Future, ops::ControlFlow, sync::Arc};

use crate::config::Config;

/// Source of one API key
#[cfg_attr(test, mockall::automock)]
pub trait CredentialProvider: Send + Sync {
    /// Name used in logs; never the key itself
    fn label(&self) -> String;

    /// Current key, or `None` when this provider has nothing to offer
    fn api_key(&self) -> Option<String>;
}

/// A key fixed at startup
pub struct StaticCredential {
    label: String,
    api_key: String,
}

impl StaticCredential {
    pub fn new(label: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            api_key: api_key.into(),
        }
    }
}

impl CredentialProvider for StaticCredential {
    fn label(&self) -> String {
        self.label.clone()
    }

    fn api_key(&self) -> Option<String> {
        Some(self.api_key.clone()).filter(|k| !k.is_empty())
    }
}

/// A key read from an environment variable on every use
pub struct EnvCredential {
    var: String,
}

impl EnvCredential {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl CredentialProvider for EnvCredential {
    fn label(&self) -> String {
        format!("env:{}", self.var)
    }

    fn api_key(&self) -> Option<String> {
        std::env::var(&self.var).ok().filter(|k| !k.trim().is_empty())
    }
}

/// A key handed to one attempt
#[derive(Clone)]
pub struct Credential {
    pub label: String,
    pub api_key: String,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("label", &self.label)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Ordered list of credential providers
#[derive(Clone, Default)]
pub struct CredentialChain {
    providers: Vec<Arc<dyn CredentialProvider>>,
}

impl CredentialChain {
    pub fn new(providers: Vec<Arc<dyn CredentialProvider>>) -> Self {
        Self { providers }
    }

    /// Chain of static keys labelled `key-1`, `key-2`, ...
    pub fn from_keys(keys: &[String]) -> Self {
        let providers = keys
            .iter()
            .enumerate()
            .map(|(i, key)| {
                Arc::new(StaticCredential::new(format!("key-{}", i + 1), key.clone()))
                    as Arc<dyn CredentialProvider>
            })
            .collect();
        Self { providers }
    }

    /// Static keys from `config`, followed by its environment-variable keys
    pub fn from_config(config: &Config) -> Self {
        let mut chain = Self::from_keys(&config.api_keys());
        chain.providers.extend(
            config
                .api_key_vars()
                .into_iter()
                .map(|var| Arc::new(EnvCredential::new(var)) as Arc<dyn CredentialProvider>),
        );
        chain
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Runs `attempt` with each available credential in order
    ///
    /// Returns the first `Break` value, or `None` once every provider has been
    /// tried.
    pub async fn first_success<T, F, Fut>(&self, mut attempt: F) -> Option<T>
    where
        F: FnMut(Credential) -> Fut,
        Fut: Future<Output = ControlFlow<T>>,
    {
        for provider in &self.providers {
            let label = provider.label();
            let Some(api_key) = provider.api_key() else {
                tracing::debug!(credential = %label, "Credential has no key, skipping");
                continue;
            };

            if let ControlFlow::Break(value) = attempt(Credential { label, api_key }).await {
                return Some(value);
            }
        }

        None
    }
}
