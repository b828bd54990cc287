//! Test helper functions for integration tests
//!
//! Shared across test files using the tests/common/ pattern.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use launchgate_core::descriptor::Node;
use launchgate_core::signing::{
    ArchiveRef, Certificate, CertificatePath, SignatureExtractor,
};
use launchgate_core::LaunchError;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize logging for tests (only once per test run)
pub fn init_test_logging() {
    INIT.call_once(|| {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let _ = tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_test_writer()
                    .with_target(true)
                    .with_level(true),
            )
            .with(tracing_subscriber::filter::EnvFilter::from_default_env())
            .try_init();
    });
}

pub fn at(year: i32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).unwrap()
}

/// Fixed evaluation instant used by the trust tests
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

/// Two-certificate path `CN=<name>` issued by `CN=<root>`
pub fn signed_by(name: &str, root: &str, valid_until: i32) -> CertificatePath {
    CertificatePath::new(vec![
        Certificate {
            subject: format!("CN={name}"),
            issuer: format!("CN={root}"),
            fingerprint: format!("sha256:{name}"),
            not_before: at(2020),
            not_after: at(valid_until),
        },
        Certificate {
            subject: format!("CN={root}"),
            issuer: format!("CN={root}"),
            fingerprint: format!("sha256:{root}"),
            not_before: at(2010),
            not_after: at(2040),
        },
    ])
}

/// Extractor answering from a fixed table keyed by archive location
#[derive(Default)]
pub struct TableExtractor {
    signers: BTreeMap<PathBuf, Vec<CertificatePath>>,
    broken: Vec<PathBuf>,
}

impl TableExtractor {
    pub fn signed(mut self, archive: &str, paths: Vec<CertificatePath>) -> Self {
        self.signers.insert(PathBuf::from(archive), paths);
        self
    }

    pub fn broken(mut self, archive: &str) -> Self {
        self.broken.push(PathBuf::from(archive));
        self
    }
}

#[async_trait]
impl SignatureExtractor for TableExtractor {
    async fn extract(&self, archive: &ArchiveRef) -> Result<Vec<CertificatePath>, LaunchError> {
        if self.broken.contains(&archive.location) {
            return Err(LaunchError::SignatureExtraction {
                archive: archive.location.clone(),
                reason: "not a signed container".to_string(),
            });
        }
        Ok(self
            .signers
            .get(&archive.location)
            .cloned()
            .unwrap_or_default())
    }

    fn name(&self) -> &'static str {
        "table"
    }
}

pub fn archives(names: &[&str]) -> Vec<ArchiveRef> {
    names.iter().map(|name| ArchiveRef::new(*name)).collect()
}

/// Shorthand for an element with attributes and children
pub fn element(name: &str, attributes: &[(&str, &str)], children: Vec<Node>) -> Node {
    attributes
        .iter()
        .fold(Node::builder(name), |builder, (key, value)| {
            builder.attribute(*key, *value)
        })
        .children(children)
        .build()
        .unwrap()
}

pub fn text(name: &str, value: &str) -> Node {
    Node::builder(name).value(value).build().unwrap()
}
