//! Launch descriptors - tree model and signed-template conformance

pub mod matcher;
pub mod node;

pub use matcher::{matches, verify_claim, MatchResult, SignedDescriptor, TemplateMatcher, WILDCARD};
pub use node::{Node, NodeBuilder};
