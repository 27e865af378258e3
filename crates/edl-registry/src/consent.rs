//! # Consent Registry
//!
//! Records which grantee a certificate subject has allowed to view which
//! certificate. Grants move from active to revoked exactly once and are
//! never deleted, so the list for a subject is a complete history.
//!
//! Several grants for the same (subject, grantee, certificate) triple may
//! coexist. Access holds while at least one of them is active.

use std::collections::BTreeMap;

use chrono::Utc;
use edl_core::{
    sha256_hex, CanonicalBytes, CanonicalizationError, CertificateId, GrantId, IdentityId,
    Timestamp,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Hex characters kept from the grant digest.
pub const GRANT_ID_HEX_LEN: usize = 16;

#[derive(Error, Debug)]
pub enum ConsentError {
    #[error("consent grant {grant_id} not found for {subject}")]
    NotFound { subject: IdentityId, grant_id: GrantId },

    #[error("consent grant {0} is already revoked")]
    AlreadyRevoked(GrantId),

    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsentStatus {
    Active,
    Revoked,
}

/// One consent grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentGrant {
    pub id: GrantId,
    pub subject: IdentityId,
    pub grantee: IdentityId,
    pub certificate_id: CertificateId,
    pub granted_at: Timestamp,
    pub status: ConsentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revoked_at: Option<Timestamp>,
}

impl ConsentGrant {
    pub fn is_active(&self) -> bool {
        self.status == ConsentStatus::Active
    }

    fn matches(&self, grantee: &IdentityId, certificate_id: &CertificateId) -> bool {
        &self.grantee == grantee && &self.certificate_id == certificate_id
    }
}

#[derive(Serialize)]
struct GrantIdInput<'a> {
    subject: &'a IdentityId,
    grantee: &'a IdentityId,
    certificate_id: &'a CertificateId,
    granted_at_nanos: i64,
    sequence: u64,
}

/// Derive a grant id: the leading [`GRANT_ID_HEX_LEN`] hex characters of
/// sha256 over the canonical grant fields. The registry sequence keeps ids
/// distinct even when two grants share a clock reading.
pub fn derive_grant_id(
    subject: &IdentityId,
    grantee: &IdentityId,
    certificate_id: &CertificateId,
    granted_at_nanos: i64,
    sequence: u64,
) -> Result<GrantId, CanonicalizationError> {
    let canonical = CanonicalBytes::new(&GrantIdInput {
        subject,
        grantee,
        certificate_id,
        granted_at_nanos,
        sequence,
    })?;
    let mut hex = sha256_hex(&canonical);
    hex.truncate(GRANT_ID_HEX_LEN);
    Ok(GrantId::new(hex))
}

/// Consent grants indexed by subject.
#[derive(Debug, Default)]
pub struct ConsentRegistry {
    grants: BTreeMap<IdentityId, Vec<ConsentGrant>>,
    sequence: u64,
}

impl ConsentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new active grant and return its id.
    pub fn grant(
        &mut self,
        subject: &IdentityId,
        grantee: &IdentityId,
        certificate_id: &CertificateId,
    ) -> Result<GrantId, ConsentError> {
        let now = Utc::now();
        let nanos = now.timestamp_nanos_opt().unwrap_or_else(|| now.timestamp());
        let sequence = self.sequence + 1;
        let id = derive_grant_id(subject, grantee, certificate_id, nanos, sequence)?;
        self.sequence = sequence;

        self.grants
            .entry(subject.clone())
            .or_default()
            .push(ConsentGrant {
                id: id.clone(),
                subject: subject.clone(),
                grantee: grantee.clone(),
                certificate_id: certificate_id.clone(),
                granted_at: Timestamp::from_utc(now),
                status: ConsentStatus::Active,
                revoked_at: None,
            });
        tracing::info!(
            grant = %id,
            subject = %subject,
            grantee = %grantee,
            certificate = %certificate_id,
            "consent granted"
        );
        Ok(id)
    }

    /// Mark one of `subject`'s grants revoked.
    pub fn revoke(
        &mut self,
        subject: &IdentityId,
        grant_id: &GrantId,
    ) -> Result<&ConsentGrant, ConsentError> {
        let grant = self
            .grants
            .get_mut(subject)
            .and_then(|list| list.iter_mut().find(|g| &g.id == grant_id))
            .ok_or_else(|| ConsentError::NotFound {
                subject: subject.clone(),
                grant_id: grant_id.clone(),
            })?;
        if !grant.is_active() {
            return Err(ConsentError::AlreadyRevoked(grant_id.clone()));
        }
        grant.status = ConsentStatus::Revoked;
        grant.revoked_at = Some(Timestamp::now());
        tracing::info!(grant = %grant_id, subject = %subject, "consent revoked");
        Ok(grant)
    }

    /// Whether at least one active grant covers the triple.
    pub fn check(
        &self,
        subject: &IdentityId,
        grantee: &IdentityId,
        certificate_id: &CertificateId,
    ) -> bool {
        self.grants.get(subject).is_some_and(|list| {
            list.iter()
                .any(|g| g.is_active() && g.matches(grantee, certificate_id))
        })
    }

    /// All of `subject`'s grants in the order they were made.
    pub fn list(&self, subject: &IdentityId) -> &[ConsentGrant] {
        self.grants.get(subject).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Certificates `grantee` currently holds an active grant for.
    pub fn accessible_to(&self, grantee: &IdentityId) -> Vec<CertificateId> {
        let mut ids: Vec<CertificateId> = Vec::new();
        for grant in self.grants.values().flatten() {
            if grant.is_active() && &grant.grantee == grantee && !ids.contains(&grant.certificate_id)
            {
                ids.push(grant.certificate_id.clone());
            }
        }
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn id(s: &str) -> IdentityId {
        IdentityId::new(s).unwrap()
    }

    fn cert(n: u64) -> CertificateId {
        CertificateId::from_sequence(n)
    }

    #[test]
    fn grant_id_vector() {
        let gid = derive_grant_id(
            &id("alice"),
            &id("hrX"),
            &cert(1),
            1_767_225_600_000_000_000,
            1,
        )
        .unwrap();
        assert_eq!(gid.as_str(), "af02bbf633fe0d39");
    }

    #[test]
    fn grant_check_revoke_cycle() {
        let mut registry = ConsentRegistry::new();
        let (alice, hr) = (id("alice"), id("hrX"));
        let gid = registry.grant(&alice, &hr, &cert(1)).unwrap();
        assert_eq!(gid.as_str().len(), GRANT_ID_HEX_LEN);
        assert!(registry.check(&alice, &hr, &cert(1)));
        assert!(!registry.check(&alice, &hr, &cert(2)));
        assert!(!registry.check(&alice, &id("hrY"), &cert(1)));

        let revoked = registry.revoke(&alice, &gid).unwrap();
        assert_eq!(revoked.status, ConsentStatus::Revoked);
        assert!(revoked.revoked_at.is_some());
        assert!(!registry.check(&alice, &hr, &cert(1)));
        assert_eq!(registry.list(&alice).len(), 1);
    }

    #[test]
    fn another_active_grant_keeps_access() {
        let mut registry = ConsentRegistry::new();
        let (alice, hr) = (id("alice"), id("hrX"));
        let first = registry.grant(&alice, &hr, &cert(1)).unwrap();
        let second = registry.grant(&alice, &hr, &cert(1)).unwrap();
        assert_ne!(first, second);

        registry.revoke(&alice, &first).unwrap();
        assert!(registry.check(&alice, &hr, &cert(1)));
        registry.revoke(&alice, &second).unwrap();
        assert!(!registry.check(&alice, &hr, &cert(1)));
    }

    #[test]
    fn revoke_errors() {
        let mut registry = ConsentRegistry::new();
        let alice = id("alice");
        let gid = registry.grant(&alice, &id("hrX"), &cert(1)).unwrap();
        registry.revoke(&alice, &gid).unwrap();
        assert!(matches!(
            registry.revoke(&alice, &gid),
            Err(ConsentError::AlreadyRevoked(_))
        ));
        assert!(matches!(
            registry.revoke(&alice, &GrantId::new("0000000000000000")),
            Err(ConsentError::NotFound { .. })
        ));
        // Another subject cannot revoke alice's grant.
        assert!(matches!(
            registry.revoke(&id("bob"), &gid),
            Err(ConsentError::NotFound { .. })
        ));
    }

    #[test]
    fn list_is_insertion_ordered_and_empty_for_strangers() {
        let mut registry = ConsentRegistry::new();
        let alice = id("alice");
        let a = registry.grant(&alice, &id("hrX"), &cert(2)).unwrap();
        let b = registry.grant(&alice, &id("hrY"), &cert(1)).unwrap();
        let ids: Vec<_> = registry.list(&alice).iter().map(|g| g.id.clone()).collect();
        assert_eq!(ids, vec![a, b]);
        assert!(registry.list(&id("nobody")).is_empty());
    }

    #[test]
    fn accessible_to_dedupes_and_skips_revoked() {
        let mut registry = ConsentRegistry::new();
        let (alice, bob, hr) = (id("alice"), id("bob"), id("hrX"));
        registry.grant(&alice, &hr, &cert(1)).unwrap();
        registry.grant(&alice, &hr, &cert(1)).unwrap();
        let revoked = registry.grant(&bob, &hr, &cert(2)).unwrap();
        registry.grant(&bob, &hr, &cert(3)).unwrap();
        registry.revoke(&bob, &revoked).unwrap();

        assert_eq!(registry.accessible_to(&hr), vec![cert(1), cert(3)]);
        assert!(registry.accessible_to(&id("hrY")).is_empty());
    }

    #[test]
    fn grant_serializes_status_snake_case() {
        let mut registry = ConsentRegistry::new();
        let alice = id("alice");
        registry.grant(&alice, &id("hrX"), &cert(1)).unwrap();
        let value = serde_json::to_value(&registry.list(&alice)[0]).unwrap();
        assert_eq!(value["status"], "active");
        assert!(value.get("revoked_at").is_none());
    }

    proptest! {
        #[test]
        fn sequence_separates_equal_inputs(nanos in any::<i64>(), seq in 0u64..1_000_000) {
            let a = derive_grant_id(&id("alice"), &id("hrX"), &cert(1), nanos, seq).unwrap();
            let b = derive_grant_id(&id("alice"), &id("hrX"), &cert(1), nanos, seq + 1).unwrap();
            prop_assert_ne!(a, b);
        }
    }
}
