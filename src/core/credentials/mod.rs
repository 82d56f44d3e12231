//! Credential Sourcing
//!
//! An API credential can come from several optional origins: environment
//! variables, or a value the user typed into the UI mid-session. Origins are
//! modelled as an ordered provider chain; the first non-empty value wins.
//!
//! Credentials are held in memory for the lifetime of the session and are
//! never written to disk. The chain is re-resolved on every remote call, so a
//! credential entered or changed mid-session takes effect on the very next
//! request.
//!
//! Credential values are never logged; `Credential` has a redacting `Debug`
//! impl.

use std::fmt;
use std::sync::{Arc, Mutex};

use crate::core::{CoreError, CoreResult};

/// Environment variables consulted by the default chain, in order.
pub const DEFAULT_ENV_VARS: [&str; 3] = ["GEMINI_API_KEY", "GOOGLE_API_KEY", "API_KEY"];

// =============================================================================
// Credential
// =============================================================================

/// An opaque API credential.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wraps a raw credential string. Returns `None` for empty/whitespace
    /// input so that "no value" and "blank value" collapse into one case.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// The raw credential value, for request construction only.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Redacted: credential values must never reach logs.
        f.write_str("Credential(<redacted>)")
    }
}

// =============================================================================
// Providers
// =============================================================================

/// A single origin a credential may come from.
pub trait CredentialProvider: Send + Sync {
    /// Origin name, used in diagnostics.
    fn name(&self) -> &str;

    /// Returns the credential this origin currently holds, if any.
    fn provide(&self) -> Option<Credential>;
}

/// Reads an ordered list of environment variables on every call.
pub struct EnvCredentialProvider {
    vars: Vec<String>,
}

impl EnvCredentialProvider {
    /// Creates a provider over a custom variable list.
    pub fn new(vars: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            vars: vars.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for EnvCredentialProvider {
    fn default() -> Self {
        Self::new(DEFAULT_ENV_VARS)
    }
}

impl CredentialProvider for EnvCredentialProvider {
    fn name(&self) -> &str {
        "environment"
    }

    fn provide(&self) -> Option<Credential> {
        self.vars
            .iter()
            .find_map(|var| std::env::var(var).ok().and_then(Credential::new))
    }
}

/// Holds a credential the user entered interactively. The slot can be filled
/// or cleared at any time; the next chain resolution observes the change.
#[derive(Default)]
pub struct EnteredCredentialProvider {
    slot: Mutex<Option<Credential>>,
}

impl EnteredCredentialProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a new credential. Returns `false` when the input was blank and
    /// the slot was left unchanged.
    pub fn set(&self, value: impl Into<String>) -> bool {
        match Credential::new(value) {
            Some(credential) => {
                *self.lock() = Some(credential);
                true
            }
            None => false,
        }
    }

    /// Forgets the stored credential.
    pub fn clear(&self) {
        *self.lock() = None;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Credential>> {
        // A poisoned lock only means a panicking writer; the slot itself is
        // always in a valid state.
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl CredentialProvider for EnteredCredentialProvider {
    fn name(&self) -> &str {
        "entered"
    }

    fn provide(&self) -> Option<Credential> {
        self.lock().clone()
    }
}

// =============================================================================
// Chain
// =============================================================================

/// Ordered list of credential origins; the first non-empty value wins.
#[derive(Clone, Default)]
pub struct CredentialChain {
    providers: Vec<Arc<dyn CredentialProvider>>,
}

impl CredentialChain {
    /// Creates an empty chain. A remote call against an empty chain fails
    /// with [`CoreError::MissingCredential`] before any network activity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the standard chain: environment variables only.
    pub fn from_env() -> Self {
        Self::new().with_provider(Arc::new(EnvCredentialProvider::default()))
    }

    /// Appends an origin to the end of the chain.
    pub fn with_provider(mut self, provider: Arc<dyn CredentialProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Resolves the chain: first non-empty credential wins.
    pub fn resolve(&self) -> CoreResult<Credential> {
        self.providers
            .iter()
            .find_map(|provider| provider.provide())
            .ok_or(CoreError::MissingCredential)
    }

    /// Whether any origin currently holds a credential.
    pub fn is_configured(&self) -> bool {
        self.resolve().is_ok()
    }
}

impl fmt::Debug for CredentialChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.providers.iter().map(|p| p.name()).collect();
        f.debug_struct("CredentialChain")
            .field("providers", &names)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
