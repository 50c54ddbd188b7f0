use crate::ast::css_tree::{CssNode, NodeKind, SelectorPart, Stylesheet};
use crate::error::ParseError;
use crate::parser::{parse_declaration, parse_selector_list, split_declarations};
use crate::style::fragment::{FragmentShape, MergedFragment};
use crate::style::locator::Directive;
use indextree::NodeId;
use log::{trace, warn};

/// Write merged fragments into the tree in place of `directive`.
///
/// Wrapped and qualified fragments become sibling rules placed before the
/// enclosing rule; plain declarations take the directive's position. The
/// directive node is removed afterwards.
pub fn splice(
    sheet: &mut Stylesheet,
    directive: &Directive,
    merged: &[MergedFragment],
) -> Result<(), ParseError> {
    let rule_selectors = match sheet.node(directive.rule).map(|node| &node.kind) {
        Some(NodeKind::Rule(rule)) => rule.selectors.clone(),
        _ => {
            warn!("@apply parent is no longer a style rule, leaving it untouched");
            return Ok(());
        }
    };
    let selector_text = rule_selectors.to_string();

    for fragment in merged {
        match fragment.shape() {
            FragmentShape::ParentWrapped(wrapper) => {
                let css = format!("{}{{{}{{{}}}}}", wrapper, selector_text, fragment.body);
                let nodes = parse_synthesized(sheet, &css, directive)?;
                sheet.insert_before(directive.rule, &nodes);
            }
            FragmentShape::SelectorQualified(selector) => {
                let pseudo_classes: Vec<SelectorPart> = parse_selector_list(selector)
                    .map_err(|err| err.with_source_name(sheet.source_name.as_deref()))?
                    .selectors
                    .iter()
                    .flat_map(|branch| branch.pseudo_classes().cloned())
                    .collect();
                let mut qualified = rule_selectors.clone();
                qualified.append_to_each(&pseudo_classes);

                let css = format!("{}{{{}}}", qualified, fragment.body);
                let nodes = parse_synthesized(sheet, &css, directive)?;
                sheet.insert_before(directive.rule, &nodes);
            }
            FragmentShape::Plain => {
                let mut nodes = Vec::new();
                for piece in split_declarations(&fragment.body) {
                    let declaration = parse_declaration(piece)
                        .map_err(|err| err.with_source_name(sheet.source_name.as_deref()))?;
                    nodes.push(sheet.new_node(CssNode::new(NodeKind::Declaration(declaration))));
                }
                sheet.insert_before(directive.node, &nodes);
            }
        }
    }

    trace!("removing spliced @apply {}", directive.payload);
    sheet.remove(directive.node);
    Ok(())
}

fn parse_synthesized(
    sheet: &mut Stylesheet,
    css: &str,
    directive: &Directive,
) -> Result<Vec<NodeId>, ParseError> {
    sheet.parse_fragment(css).map_err(|err| {
        trace!("synthesized css for `{}` failed: {}", directive.payload, css);
        err
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{generate, parse_stylesheet, ParseOptions};
    use crate::style::fragment::{UtilityFragment, EMPTY_SELECTOR};
    use crate::style::locator::locate;
    use pretty_assertions::assert_eq;

    fn sheet(css: &str) -> Stylesheet {
        let options = ParseOptions {
            raw_at_rule_preludes: true,
            ..ParseOptions::default()
        };
        parse_stylesheet(css, &options).expect("stylesheet should parse")
    }

    fn merged(selector: Option<&str>, body: &str, parent: Option<&str>) -> MergedFragment {
        MergedFragment::from(&UtilityFragment::new(0, selector, body, parent))
    }

    fn splice_first(css: &str, fragments: &[MergedFragment]) -> Result<String, ParseError> {
        let mut sheet = sheet(css);
        let directive = locate(&sheet).remove(0);
        splice(&mut sheet, &directive, fragments)?;
        Ok(generate(&sheet))
    }

    #[test]
    fn plain_body_takes_directive_position() {
        let out = splice_first(
            ".a { margin: 0; @apply x; padding: 0; }",
            &[merged(Some(EMPTY_SELECTOR), "color:red;;font-weight:700;", None)],
        )
        .expect("splice should succeed");
        assert_eq!(
            out,
            ".a {\n  margin: 0;\n  color: red;\n  font-weight: 700;\n  padding: 0;\n}\n"
        );
    }

    #[test]
    fn qualified_rule_goes_before_enclosing_rule() {
        let out = splice_first(
            ".a, .b > p { @apply x; }",
            &[merged(Some(".\\-:hover:focus"), "color:red;", None)],
        )
        .expect("splice should succeed");
        assert_eq!(
            out,
            ".a:hover:focus, .b > p:hover:focus {\n  color: red;\n}\n.a, .b > p {\n}\n"
        );
    }

    #[test]
    fn wrapped_rule_copies_selector() {
        let out = splice_first(
            ".a { @apply x; }",
            &[merged(
                Some(".\\-:hover"),
                "color:red;",
                Some("@media (min-width: 640px)"),
            )],
        )
        .expect("splice should succeed");
        assert_eq!(
            out,
            "@media (min-width: 640px) {\n  .a {\n    color: red;\n  }\n}\n.a {\n}\n"
        );
    }

    #[test]
    fn malformed_body_is_a_parse_error() {
        let err = splice_first(".a { @apply x; }", &[merged(None, "color red;", None)])
            .expect_err("invalid declaration");
        assert!(err.message.contains("invalid declaration"));

        let err = splice_first(
            ".a { @apply x; }",
            &[merged(Some(".\\-:hover"), "}", None)],
        )
        .expect_err("unbalanced body");
        assert!(!err.message.is_empty());
    }
}
