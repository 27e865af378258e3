//! # Identity Directory
//!
//! Registered identities with their role and wallet. An identity is
//! registered once and keeps its role and wallet for its lifetime.
//!
//! Capability checks live here so every entry point asks the same
//! question the same way: may this identity act in this role?

use std::collections::BTreeMap;
use std::sync::Arc;

use edl_core::{IdentityId, Role, Timestamp, ValidationError};
use edl_crypto::{Wallet, WalletAddress, WalletError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum length of a display name.
pub const MAX_DISPLAY_NAME_LEN: usize = 128;

#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("identity {0} already exists")]
    Conflict(IdentityId),

    #[error("identity {0} not found")]
    NotFound(IdentityId),

    /// The identity exists but its role does not allow the action.
    #[error("{id} ({role}) may not {action}")]
    NotPermitted {
        id: IdentityId,
        role: Role,
        action: &'static str,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Wallet(#[from] WalletError),
}

/// An action gated on role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    IssueCertificates,
    HoldCertificates,
    ReceiveConsent,
}

impl Capability {
    fn allows(self, role: Role) -> bool {
        match self {
            Self::IssueCertificates => role.can_issue(),
            Self::HoldCertificates => role.can_hold(),
            Self::ReceiveConsent => role.can_receive_consent(),
        }
    }

    fn action(self) -> &'static str {
        match self {
            Self::IssueCertificates => "issue certificates",
            Self::HoldCertificates => "hold certificates or manage consent",
            Self::ReceiveConsent => "receive consent or view consent-gated certificates",
        }
    }
}

/// A registered identity.
#[derive(Debug, Clone)]
pub struct Identity {
    pub id: IdentityId,
    pub display_name: String,
    pub role: Role,
    pub registered_at: Timestamp,
    pub wallet: Arc<Wallet>,
}

impl Identity {
    pub fn summary(&self) -> IdentitySummary {
        IdentitySummary {
            id: self.id.clone(),
            display_name: self.display_name.clone(),
            role: self.role,
            address: self.wallet.address().clone(),
        }
    }
}

/// Public view of an identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentitySummary {
    pub id: IdentityId,
    pub display_name: String,
    pub role: Role,
    pub address: WalletAddress,
}

#[derive(Debug, Default)]
pub struct IdentityDirectory {
    identities: BTreeMap<IdentityId, Identity>,
}

impl IdentityDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    pub fn contains(&self, id: &IdentityId) -> bool {
        self.identities.contains_key(id)
    }

    /// Register a new identity with a freshly generated wallet.
    pub fn register(
        &mut self,
        id: IdentityId,
        display_name: &str,
        role: Role,
    ) -> Result<&Identity, IdentityError> {
        if self.contains(&id) {
            return Err(IdentityError::Conflict(id));
        }
        let display_name = validate_display_name(display_name)?;
        let wallet = Wallet::generate(id.clone())?;
        self.register_with_wallet(id, &display_name, role, Arc::new(wallet))
    }

    /// Register a new identity with an existing wallet. The wallet owner
    /// must be the identity being registered.
    pub fn register_with_wallet(
        &mut self,
        id: IdentityId,
        display_name: &str,
        role: Role,
        wallet: Arc<Wallet>,
    ) -> Result<&Identity, IdentityError> {
        let display_name = validate_display_name(display_name)?;
        if wallet.owner() != &id {
            return Err(ValidationError::Format {
                field: "wallet",
                reason: format!("wallet belongs to {}, not {id}", wallet.owner()),
            }
            .into());
        }
        if self.contains(&id) {
            return Err(IdentityError::Conflict(id));
        }
        tracing::info!(identity = %id, %role, address = %wallet.address(), "identity registered");
        Ok(self.identities.entry(id.clone()).or_insert(Identity {
            id,
            display_name,
            role,
            registered_at: Timestamp::now(),
            wallet,
        }))
    }

    pub fn get(&self, id: &IdentityId) -> Option<&Identity> {
        self.identities.get(id)
    }

    pub fn require(&self, id: &IdentityId) -> Result<&Identity, IdentityError> {
        self.get(id)
            .ok_or_else(|| IdentityError::NotFound(id.clone()))
    }

    /// Look up an identity and check that its role grants `capability`.
    pub fn require_capability(
        &self,
        id: &IdentityId,
        capability: Capability,
    ) -> Result<&Identity, IdentityError> {
        let identity = self.require(id)?;
        if !capability.allows(identity.role) {
            tracing::warn!(identity = %id, role = %identity.role, action = capability.action(), "capability denied");
            return Err(IdentityError::NotPermitted {
                id: id.clone(),
                role: identity.role,
                action: capability.action(),
            });
        }
        Ok(identity)
    }

    /// First identity with this display name and role, by id order.
    pub fn find_by_display_name(&self, name: &str, role: Role) -> Option<&Identity> {
        let name = name.trim();
        self.identities
            .values()
            .find(|i| i.role == role && i.display_name == name)
    }

    pub fn list_by_role(&self, role: Role) -> Vec<IdentitySummary> {
        self.identities
            .values()
            .filter(|i| i.role == role)
            .map(Identity::summary)
            .collect()
    }
}

fn validate_display_name(name: &str) -> Result<String, ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::Empty {
            field: "display_name",
        });
    }
    if name.chars().count() > MAX_DISPLAY_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "display_name",
            max: MAX_DISPLAY_NAME_LEN,
        });
    }
    Ok(name.to_string())
}
