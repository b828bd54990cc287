//! Structural comparison of a launching descriptor against a signed one
//!
//! A signed archive may carry an exact copy of the application descriptor or
//! a template for it. The launching descriptor only inherits the archive's
//! trust when it conforms. Comparison ignores the order of children and
//! attributes; in template mode a `*` value in the template accepts anything.

use crate::descriptor::node::Node;
use crate::error::LaunchError;
use serde::Serialize;
use std::cell::OnceCell;
use tracing::{debug, trace};

/// Wildcard accepted by templates for element and attribute values
pub const WILDCARD: &str = "*";

/// Compare two descriptor trees
///
/// With `template_mode` off the comparison is literal. Children are paired
/// greedily: each template child takes the first remaining candidate child it
/// matches, which is not a maximum matching and is kept that way on purpose.
pub fn matches(template: &Node, candidate: &Node, template_mode: bool) -> bool {
    if template.name() != candidate.name() {
        return false;
    }

    let mut template_children: Vec<&Node> = template.children().iter().collect();
    let mut candidate_children: Vec<&Node> = candidate.children().iter().collect();

    if template_children.len() != candidate_children.len() {
        return false;
    }

    while let Some(&next) = template_children.first() {
        let paired = candidate_children
            .iter()
            .position(|child| matches(next, child, template_mode));

        match paired {
            Some(index) => {
                template_children.remove(0);
                candidate_children.remove(index);
            }
            None => {
                trace!(
                    "No counterpart for <{}> under <{}>",
                    next.name(),
                    template.name()
                );
                return false;
            }
        }
    }

    if !values_match(template.value(), candidate.value(), template_mode) {
        return false;
    }

    attributes_match(template, candidate, template_mode)
}

fn values_match(template: &str, candidate: &str, template_mode: bool) -> bool {
    template == candidate || (template_mode && template == WILDCARD)
}

/// Attribute names must be identical as sets; values are paired by sorted name
fn attributes_match(template: &Node, candidate: &Node, template_mode: bool) -> bool {
    let mut template_names = template.attribute_names();
    let mut candidate_names = candidate.attribute_names();
    template_names.sort_unstable();
    candidate_names.sort_unstable();

    if template_names.len() != candidate_names.len() {
        return false;
    }

    for (template_name, candidate_name) in template_names.iter().zip(&candidate_names) {
        if template_name != candidate_name {
            return false;
        }

        let expected = template.attribute(template_name).unwrap_or_default();
        let actual = candidate.attribute(candidate_name).unwrap_or_default();
        if !values_match(expected, actual, template_mode) {
            return false;
        }
    }

    true
}

/// Compares a signed descriptor with a launching one, computing the result once
#[derive(Debug)]
pub struct TemplateMatcher {
    template: Node,
    launching: Node,
    template_mode: bool,
    result: OnceCell<bool>,
}

impl TemplateMatcher {
    pub fn new(template: Node, launching: Node, template_mode: bool) -> Self {
        TemplateMatcher {
            template,
            launching,
            template_mode,
            result: OnceCell::new(),
        }
    }

    /// Whether the two trees match; the comparison runs on the first call only
    pub fn is_match(&self) -> bool {
        *self
            .result
            .get_or_init(|| matches(&self.template, &self.launching, self.template_mode))
    }

    pub fn template(&self) -> &Node {
        &self.template
    }

    pub fn launching(&self) -> &Node {
        &self.launching
    }

    pub fn is_template(&self) -> bool {
        self.template_mode
    }

    pub fn into_result(self) -> MatchResult {
        let matched = self.is_match();
        MatchResult {
            matched,
            template_mode: self.template_mode,
            template: self.template,
            candidate: self.launching,
        }
    }
}

/// Outcome of a comparison, with both roots kept for diagnostics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchResult {
    pub matched: bool,
    pub template_mode: bool,
    pub template: Node,
    pub candidate: Node,
}

/// The descriptor found inside a signed archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignedDescriptor {
    /// Exact signed copy of the application descriptor
    Application(Node),
    /// Signed template; `*` values accept any launching value
    Template(Node),
}

impl SignedDescriptor {
    pub fn node(&self) -> &Node {
        match self {
            SignedDescriptor::Application(node) | SignedDescriptor::Template(node) => node,
        }
    }

    pub fn is_template(&self) -> bool {
        matches!(self, SignedDescriptor::Template(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SignedDescriptor::Application(_) => "application descriptor",
            SignedDescriptor::Template(_) => "descriptor template",
        }
    }
}

/// Check that a launching descriptor conforms to the signed one
pub fn verify_claim(
    signed: &SignedDescriptor,
    launching: &Node,
) -> Result<MatchResult, LaunchError> {
    let matcher = TemplateMatcher::new(
        signed.node().clone(),
        launching.clone(),
        signed.is_template(),
    );

    if !matcher.is_match() {
        return Err(LaunchError::DescriptorMismatch {
            kind: signed.kind(),
        });
    }

    debug!("Launching descriptor conforms to the signed {}", signed.kind());
    Ok(matcher.into_result())
}
