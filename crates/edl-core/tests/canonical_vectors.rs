//! # Canonical Digest Vectors
//!
//! Fixed vectors computed independently with
//! `json.dumps(obj, sort_keys=True, separators=(",", ":"))` + SHA-256.
//! If these drift, every persisted journal and every issued signature
//! becomes unverifiable.

use edl_core::{
    sha256_hex, CanonicalBytes, CertificateBody, CertificateId, IdentityId, IssueDate,
};

#[test]
fn genesis_shaped_block_vector() {
    let data = serde_json::json!({
        "timestamp": "2026-01-01T00:00:00Z",
        "previous_hash": "0",
        "payload": {"type": "genesis"},
        "nonce": 0,
        "index": 0,
    });
    let cb = CanonicalBytes::new(&data).unwrap();
    assert_eq!(
        cb.as_str(),
        r#"{"index":0,"nonce":0,"payload":{"type":"genesis"},"previous_hash":"0","timestamp":"2026-01-01T00:00:00Z"}"#
    );
    assert_eq!(
        sha256_hex(&cb),
        "2fd089413296938b93ff7fb94f986b21f2d4a73fa90b90ae000791fb772f677e"
    );
}

#[test]
fn certificate_body_vector() {
    let body = CertificateBody {
        id: CertificateId::from_sequence(1),
        subject: IdentityId::new("alice").unwrap(),
        issuer: IdentityId::new("inst1").unwrap(),
        course: "Cryptography".to_string(),
        grade: "A".to_string(),
        issue_date: IssueDate::from_ymd(2026, 6, 1).unwrap(),
        artifact: None,
    };
    let cb = body.signing_bytes().unwrap();
    assert_eq!(
        cb.as_str(),
        r#"{"course":"Cryptography","grade":"A","id":"CERT-0001","issue_date":"2026-06-01","issuer":"inst1","subject":"alice"}"#
    );
    assert_eq!(
        sha256_hex(&cb),
        "4f62054980b770731860f5e1e71eca8d44132420aaf9fdade2de09d8c9d797ce"
    );
}

#[test]
fn struct_and_map_with_same_fields_hash_identically() {
    let body = CertificateBody {
        id: CertificateId::from_sequence(1),
        subject: IdentityId::new("alice").unwrap(),
        issuer: IdentityId::new("inst1").unwrap(),
        course: "Cryptography".to_string(),
        grade: "A".to_string(),
        issue_date: IssueDate::from_ymd(2026, 6, 1).unwrap(),
        artifact: None,
    };
    let map = serde_json::json!({
        "subject": "alice",
        "issue_date": "2026-06-01",
        "issuer": "inst1",
        "grade": "A",
        "id": "CERT-0001",
        "course": "Cryptography",
    });
    assert_eq!(
        sha256_hex(&body.signing_bytes().unwrap()),
        sha256_hex(&CanonicalBytes::new(&map).unwrap())
    );
}
