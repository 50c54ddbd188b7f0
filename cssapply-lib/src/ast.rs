use indextree::{Arena, NodeId};

pub mod css_tree {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum NodeKind {
        StyleSheet,
        Rule(RuleNode),
        AtRule(AtRuleNode),
        Declaration(Declaration),
    }

    /// One node in the arena, with the place it was parsed from when positions are tracked.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct CssNode {
        pub kind: NodeKind,
        pub location: Option<Location>,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Location {
        pub line: u32,
        pub column: u32,
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct RuleNode {
        pub selectors: SelectorList,
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct AtRuleNode {
        /// Name without the leading `@`, as written.
        pub name: String,
        pub prelude: Option<AtRulePrelude>,
        pub has_block: bool,
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum AtRulePrelude {
        /// Literal prelude text, kept when parsing with raw preludes.
        Raw(String),
        /// Whitespace-separated component values.
        Components(Vec<String>),
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Declaration {
        pub property: String,
        pub value: String,
        pub important: bool,
    }

    #[derive(Debug, Clone, Default, PartialEq, Eq)]
    pub struct SelectorList {
        pub selectors: Vec<Selector>,
    }

    /// A single comma-separated branch of a selector list.
    #[derive(Debug, Clone, Default, PartialEq, Eq)]
    pub struct Selector {
        pub parts: Vec<SelectorPart>,
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum SelectorPart {
        /// Type, class, id, attribute, universal or nesting selector text.
        Simple(String),
        /// `:hover`, `:not(.a)`, including the colon.
        PseudoClass(String),
        /// `::before`, including both colons.
        PseudoElement(String),
        Combinator(Combinator),
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Combinator {
        Descendant,
        Child,
        NextSibling,
        SubsequentSibling,
    }

    /// A parsed stylesheet. Nodes are addressed by arena handles, which stay
    /// valid while other parts of the tree are inserted or removed.
    #[derive(Debug)]
    pub struct Stylesheet {
        pub arena: Arena<CssNode>,
        pub root: NodeId,
        pub source_name: Option<String>,
    }

    impl CssNode {
        pub fn new(kind: NodeKind) -> Self {
            CssNode {
                kind,
                location: None,
            }
        }

        pub fn at(kind: NodeKind, location: Option<Location>) -> Self {
            CssNode { kind, location }
        }
    }

    impl AtRuleNode {
        /// The literal prelude text, if the prelude was kept raw.
        pub fn raw_prelude(&self) -> Option<&str> {
            match &self.prelude {
                Some(AtRulePrelude::Raw(text)) => Some(text),
                _ => None,
            }
        }
    }

    impl Selector {
        pub fn pseudo_classes(&self) -> impl Iterator<Item = &SelectorPart> {
            self.parts
                .iter()
                .filter(|part| matches!(part, SelectorPart::PseudoClass(_)))
        }
    }

    impl SelectorList {
        /// Append `parts` to the end of every branch.
        pub fn append_to_each(&mut self, parts: &[SelectorPart]) {
            for selector in &mut self.selectors {
                selector.parts.extend_from_slice(parts);
            }
        }
    }

    impl Stylesheet {
        pub fn new(source_name: Option<&str>) -> Self {
            let mut arena = Arena::new();
            let root = arena.new_node(CssNode::new(NodeKind::StyleSheet));
            Stylesheet {
                arena,
                root,
                source_name: source_name.map(str::to_string),
            }
        }

        pub fn node(&self, id: NodeId) -> Option<&CssNode> {
            self.arena.get(id).map(|node| node.get())
        }

        pub fn children(&self, id: NodeId) -> Vec<NodeId> {
            id.children(&self.arena).collect()
        }

        pub fn parent(&self, id: NodeId) -> Option<NodeId> {
            self.arena.get(id).and_then(|node| node.parent())
        }

        /// Visit every live node depth-first in document order, the root included.
        pub fn walk<F>(&self, mut visit: F)
        where
            F: FnMut(NodeId, &CssNode),
        {
            for id in self.root.descendants(&self.arena) {
                visit(id, self.arena[id].get());
            }
        }

        /// Insert `nodes` in order immediately before `anchor`, as its siblings.
        pub fn insert_before(&mut self, anchor: NodeId, nodes: &[NodeId]) {
            for &node in nodes {
                node.detach(&mut self.arena);
                anchor.insert_before(node, &mut self.arena);
            }
        }

        /// Append `nodes` in order as the last children of `parent`.
        pub fn append(&mut self, parent: NodeId, nodes: &[NodeId]) {
            for &node in nodes {
                node.detach(&mut self.arena);
                parent.append(node, &mut self.arena);
            }
        }

        /// Remove `node` and everything below it.
        pub fn remove(&mut self, node: NodeId) {
            node.remove_subtree(&mut self.arena);
        }

        pub fn is_removed(&self, node: NodeId) -> bool {
            node.is_removed(&self.arena)
        }

        pub fn new_node(&mut self, node: CssNode) -> NodeId {
            self.arena.new_node(node)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::css_tree::*;

    fn declaration(property: &str, value: &str) -> CssNode {
        CssNode::new(NodeKind::Declaration(Declaration {
            property: property.to_string(),
            value: value.to_string(),
            important: false,
        }))
    }

    fn properties(sheet: &Stylesheet, parent: indextree::NodeId) -> Vec<String> {
        sheet
            .children(parent)
            .into_iter()
            .filter_map(|id| match &sheet.node(id)?.kind {
                NodeKind::Declaration(decl) => Some(decl.property.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn handles_survive_unrelated_mutations() {
        let mut sheet = Stylesheet::new(None);
        let rule = sheet.new_node(CssNode::new(NodeKind::Rule(RuleNode {
            selectors: SelectorList::default(),
        })));
        sheet.append(sheet.root, &[rule]);

        let first = sheet.new_node(declaration("a", "1"));
        let second = sheet.new_node(declaration("b", "2"));
        sheet.append(rule, &[first, second]);

        let before_first = sheet.new_node(declaration("x", "0"));
        sheet.insert_before(first, &[before_first]);
        sheet.remove(first);

        // `second` was obtained before both mutations and still addresses the same item.
        let before_second = sheet.new_node(declaration("y", "0"));
        sheet.insert_before(second, &[before_second]);

        assert!(sheet.is_removed(first));
        assert_eq!(properties(&sheet, rule), vec!["x", "y", "b"]);
    }

    #[test]
    fn walk_visits_in_document_order() {
        let mut sheet = Stylesheet::new(None);
        let rule = sheet.new_node(CssNode::new(NodeKind::Rule(RuleNode {
            selectors: SelectorList::default(),
        })));
        let decl = sheet.new_node(declaration("color", "red"));
        sheet.append(sheet.root, &[rule]);
        sheet.append(rule, &[decl]);

        let mut seen = Vec::new();
        sheet.walk(|id, _| seen.push(id));
        assert_eq!(seen, vec![sheet.root, rule, decl]);
    }

    #[test]
    fn append_to_each_extends_every_branch() {
        let mut list = SelectorList {
            selectors: vec![
                Selector {
                    parts: vec![SelectorPart::Simple(".a".into())],
                },
                Selector {
                    parts: vec![SelectorPart::Simple(".b".into())],
                },
            ],
        };
        list.append_to_each(&[SelectorPart::PseudoClass(":hover".into())]);
        for selector in &list.selectors {
            assert_eq!(
                selector.parts.last(),
                Some(&SelectorPart::PseudoClass(":hover".into()))
            );
        }
    }
}
