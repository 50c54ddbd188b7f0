use crate::ast::css_tree::{
    AtRulePrelude, Combinator, Declaration, NodeKind, Selector, SelectorList, SelectorPart,
    Stylesheet,
};
use indextree::NodeId;
use std::fmt;

const INDENT: &str = "  ";

/// Print a stylesheet back to CSS text, one item per line with two-space indentation.
pub fn generate(sheet: &Stylesheet) -> String {
    let mut out = String::new();
    print_node(sheet, sheet.root, 0, &mut out);
    out
}

fn print_node(sheet: &Stylesheet, id: NodeId, depth: usize, out: &mut String) {
    let Some(node) = sheet.node(id) else {
        return;
    };
    let indent = INDENT.repeat(depth);

    match &node.kind {
        NodeKind::StyleSheet => print_children(sheet, id, depth, out),
        NodeKind::Rule(rule) => {
            out.push_str(&format!("{}{} {{\n", indent, rule.selectors));
            print_children(sheet, id, depth + 1, out);
            out.push_str(&format!("{}}}\n", indent));
        }
        NodeKind::AtRule(at_rule) => {
            out.push_str(&format!("{}@{}", indent, at_rule.name));
            match &at_rule.prelude {
                Some(AtRulePrelude::Raw(text)) => out.push_str(&format!(" {}", text)),
                Some(AtRulePrelude::Components(components)) => {
                    out.push_str(&format!(" {}", components.join(" ")))
                }
                None => {}
            }
            if at_rule.has_block {
                out.push_str(" {\n");
                print_children(sheet, id, depth + 1, out);
                out.push_str(&format!("{}}}\n", indent));
            } else {
                out.push_str(";\n");
            }
        }
        NodeKind::Declaration(declaration) => {
            out.push_str(&format!("{}{};\n", indent, declaration));
        }
    }
}

fn print_children(sheet: &Stylesheet, id: NodeId, depth: usize, out: &mut String) {
    for child in id.children(&sheet.arena) {
        print_node(sheet, child, depth, out);
    }
}

impl fmt::Display for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.property, self.value)?;
        if self.important {
            f.write_str(" !important")?;
        }
        Ok(())
    }
}

impl fmt::Display for SelectorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, selector) in self.selectors.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", selector)?;
        }
        Ok(())
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, part) in self.parts.iter().enumerate() {
            match part {
                SelectorPart::Simple(text)
                | SelectorPart::PseudoClass(text)
                | SelectorPart::PseudoElement(text) => f.write_str(text)?,
                SelectorPart::Combinator(Combinator::Descendant) => f.write_str(" ")?,
                SelectorPart::Combinator(combinator) => {
                    let symbol = match combinator {
                        Combinator::Child => ">",
                        Combinator::NextSibling => "+",
                        _ => "~",
                    };
                    // A leading combinator is a relative selector inside a nested rule.
                    if index > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{} ", symbol)?;
                }
            }
        }
        Ok(())
    }
}
