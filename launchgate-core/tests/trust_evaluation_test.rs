//! Certificate trust evaluation across archive sets

mod common;

use common::{archives, now, signed_by, TableExtractor};
use launchgate_core::signing::{evaluate, CertVerifier, StaticTrustStore, TrustVerdict};
use chrono::Duration;
use pretty_assertions::assert_eq;
use std::collections::BTreeSet;
use std::sync::Arc;

#[tokio::test]
async fn test_fully_signing_set_is_the_intersection() {
    common::init_test_logging();
    let p1 = signed_by("p1", "Root", 2030);
    let p2 = signed_by("p2", "Root", 2030);
    let p3 = signed_by("p3", "Root", 2030);

    let extractor = TableExtractor::default()
        .signed("a.jar", vec![p1.clone(), p2.clone(), p3.clone()])
        .signed("b.jar", vec![p3.clone(), p2.clone()]);
    let mut verifier = CertVerifier::new(Arc::new(extractor));
    verifier.add_archives(&archives(&["a.jar", "b.jar"])).await.unwrap();

    assert_eq!(
        verifier.fully_signing_certificate_paths(),
        BTreeSet::from([p2, p3])
    );
}

#[tokio::test]
async fn test_disjoint_signers_are_not_fully_signed() {
    let extractor = TableExtractor::default()
        .signed("a.jar", vec![signed_by("p1", "Root", 2030)])
        .signed("b.jar", vec![signed_by("p2", "Root", 2030)]);
    let mut verifier = CertVerifier::new(Arc::new(extractor));
    verifier.add_archives(&archives(&["a.jar", "b.jar"])).await.unwrap();

    assert!(!verifier.is_fully_signed());
}

#[tokio::test]
async fn test_duplicate_registration_is_idempotent() {
    let p1 = signed_by("p1", "Root", 2030);
    let extractor = TableExtractor::default().signed("a.jar", vec![p1.clone()]);
    let mut verifier = CertVerifier::new(Arc::new(extractor));

    verifier.add_archives(&archives(&["a.jar", "a.jar"])).await.unwrap();
    verifier.add_archives(&archives(&["a.jar"])).await.unwrap();

    assert_eq!(verifier.archives().count(), 1);
    assert_eq!(verifier.fully_signing_certificate_paths(), BTreeSet::from([p1]));
}

#[tokio::test]
async fn test_scenario_shared_signer_with_trusted_root() {
    let p1 = signed_by("p1", "Other Root", 2030);
    let p2 = signed_by("p2", "Trusted Root", 2030);
    let extractor = TableExtractor::default()
        .signed("x.jar", vec![p1, p2.clone()])
        .signed("y.jar", vec![p2.clone()]);

    let mut verifier = CertVerifier::new(Arc::new(extractor));
    verifier.add_archives(&archives(&["x.jar", "y.jar"])).await.unwrap();
    let fully_signing = verifier.fully_signing_certificate_paths();
    assert_eq!(fully_signing, BTreeSet::from([p2.clone()]));

    let store = StaticTrustStore::new().with_root("sha256:Trusted Root");
    let evaluation = evaluate(fully_signing, &store, now(), Duration::days(180));
    assert_eq!(evaluation.verdict, TrustVerdict::FullyTrustedSigned);
    assert!(evaluation.info_by_path[&p2].is_root_in_trust_store);
    assert!(!evaluation.info_by_path[&p2].has_signing_issues);
}

#[tokio::test]
async fn test_trusted_path_with_issue_next_to_clean_trusted_path() {
    let expired = signed_by("expired", "Root", 2024);
    let healthy = signed_by("healthy", "Root", 2030);
    let store = StaticTrustStore::new().with_root("sha256:Root");

    let evaluation = evaluate(
        BTreeSet::from([expired.clone(), healthy]),
        &store,
        now(),
        Duration::days(180),
    );

    assert_eq!(evaluation.verdict, TrustVerdict::FullyTrustedSigned);
    assert!(evaluation.info_by_path[&expired].has_signing_issues);
}

#[tokio::test]
async fn test_revoked_signer_is_untrusted() {
    let path = signed_by("revoked", "Root", 2030);
    let store = StaticTrustStore::new()
        .with_root("sha256:Root")
        .with_revoked("sha256:revoked");

    let evaluation = evaluate(BTreeSet::from([path]), &store, now(), Duration::days(180));
    assert_eq!(evaluation.verdict, TrustVerdict::FullySignedButUntrusted);
}

#[tokio::test]
async fn test_evaluation_depends_on_the_instant() {
    let path = signed_by("p1", "Root", 2026);
    let store = StaticTrustStore::new().with_root("sha256:Root");

    let before = evaluate(BTreeSet::from([path.clone()]), &store, now(), Duration::days(180));
    let after = evaluate(
        BTreeSet::from([path]),
        &store,
        now() + Duration::days(365),
        Duration::days(180),
    );

    assert_eq!(before.verdict, TrustVerdict::FullyTrustedSigned);
    assert_eq!(after.verdict, TrustVerdict::FullySignedButUntrusted);
}
