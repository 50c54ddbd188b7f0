use crate::ast::css_tree::{Location, NodeKind, Stylesheet};
use indextree::NodeId;
use log::trace;

pub const DIRECTIVE_NAME: &str = "apply";

/// An `@apply` at-rule found directly inside a style rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    /// The enclosing style rule.
    pub rule: NodeId,
    /// The `@apply` node itself.
    pub node: NodeId,
    /// Literal prelude: the requested class names.
    pub payload: String,
    pub location: Option<Location>,
}

/// Find every expandable `@apply` in document order.
pub fn locate(sheet: &Stylesheet) -> Vec<Directive> {
    let mut found = Vec::new();
    sheet.walk(|id, node| {
        if !matches!(node.kind, NodeKind::Rule(_)) {
            return;
        }
        for child in id.children(&sheet.arena) {
            let child_node = sheet.arena[child].get();
            let NodeKind::AtRule(at_rule) = &child_node.kind else {
                continue;
            };
            if at_rule.name != DIRECTIVE_NAME {
                continue;
            }
            match at_rule.raw_prelude() {
                Some(payload) => found.push(Directive {
                    rule: id,
                    node: child,
                    payload: payload.to_string(),
                    location: child_node.location,
                }),
                None => trace!("skipping @apply without a literal prelude"),
            }
        }
    });
    found
}
