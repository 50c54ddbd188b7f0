//! Tokenizer-driven CSS parser that builds a [`Stylesheet`] arena.
//!
//! Preludes and declaration values are kept as the raw source text, so the
//! printer can reproduce them without a full value grammar. Comments between
//! items are dropped.

use crate::ast::css_tree::{
    AtRuleNode, AtRulePrelude, CssNode, Declaration, Location, NodeKind, RuleNode, Stylesheet,
};
use crate::error::ParseError;
use crate::parser::selector::read_selector_list;
use cssparser::{
    BasicParseErrorKind, ParseError as CssParseError, ParseErrorKind, Parser, ParserInput,
    SourceLocation, SourcePosition, Token,
};
use indextree::{Arena, NodeId};
use thiserror::Error;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Keep at-rule preludes as literal text instead of splitting them into components.
    pub raw_at_rule_preludes: bool,
    /// Record the line and column of every node.
    pub track_positions: bool,
    /// File name used in error messages.
    pub source_name: Option<String>,
}

/// What kind of item list is being parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseContext {
    /// Top level of a stylesheet: rules and at-rules only.
    StyleSheet,
    /// Inside a block: declarations, nested rules and at-rules.
    Block,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum SyntaxError {
    #[error("expected '{{' after `{0}`")]
    MissingBlock(String),

    #[error("unexpected '}}'")]
    UnexpectedCloseBrace,

    #[error("invalid declaration `{0}`")]
    InvalidDeclaration(String),

    #[error("invalid selector `{selector}`: {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("empty selector")]
    EmptySelector,

    #[error("selector ends with a combinator")]
    DanglingCombinator,

    #[error("expected a pseudo-class or pseudo-element name after ':'")]
    ExpectedPseudoName,
}

struct TreeBuilder<'a> {
    arena: &'a mut Arena<CssNode>,
    options: &'a ParseOptions,
}

impl TreeBuilder<'_> {
    fn push(&mut self, parent: NodeId, kind: NodeKind, location: Option<Location>) -> NodeId {
        let id = self.arena.new_node(CssNode::at(kind, location));
        parent.append(id, self.arena);
        id
    }

    fn location(&self, location: SourceLocation) -> Option<Location> {
        self.options.track_positions.then(|| to_location(location))
    }
}

/// Parse a complete stylesheet.
pub fn parse_stylesheet(css: &str, options: &ParseOptions) -> Result<Stylesheet, ParseError> {
    let mut sheet = Stylesheet::new(options.source_name.as_deref());
    let root = sheet.root;
    parse_into(&mut sheet.arena, root, css, ParseContext::StyleSheet, options)?;
    Ok(sheet)
}

/// Parse `css` and append the resulting items as children of `parent`.
pub fn parse_into(
    arena: &mut Arena<CssNode>,
    parent: NodeId,
    css: &str,
    context: ParseContext,
    options: &ParseOptions,
) -> Result<(), ParseError> {
    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);
    let mut builder = TreeBuilder { arena, options };
    parse_items(&mut parser, &mut builder, parent, context)
        .map_err(|err| convert_error(err, options.source_name.as_deref()))
}

impl Stylesheet {
    /// Parse a standalone piece of CSS into this stylesheet's arena.
    ///
    /// The returned top-level nodes are detached; insert them with
    /// [`Stylesheet::insert_before`] or [`Stylesheet::append`].
    pub fn parse_fragment(&mut self, css: &str) -> Result<Vec<NodeId>, ParseError> {
        let options = ParseOptions {
            raw_at_rule_preludes: true,
            source_name: self.source_name.clone(),
            ..ParseOptions::default()
        };
        let holder = self.arena.new_node(CssNode::new(NodeKind::StyleSheet));
        if let Err(err) = parse_into(
            &mut self.arena,
            holder,
            css,
            ParseContext::StyleSheet,
            &options,
        ) {
            holder.remove_subtree(&mut self.arena);
            return Err(err);
        }

        let nodes: Vec<NodeId> = holder.children(&self.arena).collect();
        for &node in &nodes {
            node.detach(&mut self.arena);
        }
        holder.remove(&mut self.arena);
        Ok(nodes)
    }
}

fn parse_items<'i>(
    parser: &mut Parser<'i, '_>,
    builder: &mut TreeBuilder<'_>,
    parent: NodeId,
    context: ParseContext,
) -> Result<(), CssParseError<'i, SyntaxError>> {
    loop {
        let location = parser.current_source_location();
        let start = parser.position();
        let token = match parser.next_including_whitespace_and_comments() {
            Ok(token) => token.clone(),
            Err(_) => return Ok(()),
        };

        match token {
            Token::WhiteSpace(_)
            | Token::Comment(_)
            | Token::Semicolon
            | Token::CDO
            | Token::CDC => continue,
            Token::AtKeyword(name) => {
                parse_at_rule(parser, builder, parent, name.to_string(), location)?
            }
            Token::CloseCurlyBracket => {
                return Err(parser.new_custom_error(SyntaxError::UnexpectedCloseBrace))
            }
            Token::CurlyBracketBlock => {
                return Err(custom_error(SyntaxError::EmptySelector, location));
            }
            Token::Function(_) | Token::ParenthesisBlock | Token::SquareBracketBlock => {
                skip_block(parser)?;
                parse_qualified(parser, builder, parent, context, start, location)?
            }
            _ => parse_qualified(parser, builder, parent, context, start, location)?,
        }
    }
}

fn parse_at_rule<'i>(
    parser: &mut Parser<'i, '_>,
    builder: &mut TreeBuilder<'_>,
    parent: NodeId,
    name: String,
    location: SourceLocation,
) -> Result<(), CssParseError<'i, SyntaxError>> {
    let start = parser.position();
    let (end, has_block) = scan_to_terminator(parser)?;

    let text = parser.slice(start..end).trim();
    let prelude = if text.is_empty() {
        None
    } else if builder.options.raw_at_rule_preludes {
        Some(AtRulePrelude::Raw(text.to_string()))
    } else {
        Some(AtRulePrelude::Components(
            text.split_whitespace().map(str::to_string).collect(),
        ))
    };

    let location = builder.location(location);
    let id = builder.push(
        parent,
        NodeKind::AtRule(AtRuleNode {
            name,
            prelude,
            has_block,
        }),
        location,
    );

    if has_block {
        parser.parse_nested_block(|nested| parse_items(nested, builder, id, ParseContext::Block))?;
    }
    Ok(())
}

/// A qualified rule, or a declaration when inside a block. The first token has
/// already been consumed; `start` points at it.
fn parse_qualified<'i>(
    parser: &mut Parser<'i, '_>,
    builder: &mut TreeBuilder<'_>,
    parent: NodeId,
    context: ParseContext,
    start: SourcePosition,
    location: SourceLocation,
) -> Result<(), CssParseError<'i, SyntaxError>> {
    let (end, has_block) = scan_to_terminator(parser)?;
    let text = parser.slice(start..end).trim();

    if has_block {
        let selectors = parse_rule_selectors(text, location)?;
        let location = builder.location(location);
        let id = builder.push(parent, NodeKind::Rule(RuleNode { selectors }), location);
        return parser
            .parse_nested_block(|nested| parse_items(nested, builder, id, ParseContext::Block));
    }

    if context == ParseContext::StyleSheet {
        return Err(custom_error(
            SyntaxError::MissingBlock(text.to_string()),
            location,
        ));
    }

    let declaration = declaration_from_text(text)
        .ok_or_else(|| custom_error(SyntaxError::InvalidDeclaration(text.to_string()), location))?;
    let location = builder.location(location);
    builder.push(parent, NodeKind::Declaration(declaration), location);
    Ok(())
}

fn parse_rule_selectors<'i>(
    text: &str,
    location: SourceLocation,
) -> Result<crate::ast::css_tree::SelectorList, CssParseError<'i, SyntaxError>> {
    let mut input = ParserInput::new(text);
    let mut parser = Parser::new(&mut input);
    read_selector_list(&mut parser).map_err(|err| {
        custom_error(
            SyntaxError::InvalidSelector {
                selector: text.to_string(),
                reason: error_message(&err.kind),
            },
            location,
        )
    })
}

/// Parse one `property: value [!important]` declaration.
pub fn parse_declaration(text: &str) -> Result<Declaration, ParseError> {
    declaration_from_text(text).ok_or_else(|| {
        let error = SyntaxError::InvalidDeclaration(text.trim().to_string());
        ParseError::new(error.to_string(), 1, 1)
    })
}

/// Split a declaration body on top-level semicolons. One trailing `;` is
/// ignored and blank pieces are skipped; semicolons inside strings, functions
/// and blocks do not split.
pub fn split_declarations(body: &str) -> Vec<&str> {
    let body = body.strip_suffix(';').unwrap_or(body);
    let mut input = ParserInput::new(body);
    let mut parser = Parser::new(&mut input);
    let mut pieces = Vec::new();
    let mut start = parser.position();
    loop {
        let before = parser.position();
        let token = match parser.next_including_whitespace_and_comments() {
            Ok(token) => token.clone(),
            Err(_) => {
                pieces.push(parser.slice(start..before));
                break;
            }
        };
        match token {
            Token::Semicolon => {
                pieces.push(parser.slice(start..before));
                start = parser.position();
            }
            token if opens_block(&token) => {
                // A malformed block still ends at its closing token or the end of input.
                let _ = skip_block(&mut parser);
            }
            _ => {}
        }
    }
    pieces
        .into_iter()
        .filter(|piece| !piece.trim().is_empty())
        .collect()
}

/// Advance to the next `;`, `{` or end of input at this nesting level.
///
/// Returns the position just before the terminator and whether it opened a
/// block. Nested `(...)`, `[...]` and function blocks are consumed first, so
/// the position always lies after their closing token.
fn scan_to_terminator<'i>(
    parser: &mut Parser<'i, '_>,
) -> Result<(SourcePosition, bool), CssParseError<'i, SyntaxError>> {
    loop {
        let before = parser.position();
        let token = match parser.next_including_whitespace_and_comments() {
            Ok(token) => token.clone(),
            Err(_) => return Ok((before, false)),
        };
        match token {
            Token::Semicolon => return Ok((before, false)),
            Token::CurlyBracketBlock => return Ok((before, true)),
            token if opens_block(&token) => skip_block(parser)?,
            _ => {}
        }
    }
}

fn opens_block(token: &Token<'_>) -> bool {
    matches!(
        token,
        Token::Function(_)
            | Token::ParenthesisBlock
            | Token::SquareBracketBlock
            | Token::CurlyBracketBlock
    )
}

/// Consume the block opened by the token just returned.
pub(crate) fn skip_block<'i>(
    parser: &mut Parser<'i, '_>,
) -> Result<(), CssParseError<'i, SyntaxError>> {
    parser.parse_nested_block(|nested| {
        while nested.next_including_whitespace_and_comments().is_ok() {}
        Ok(())
    })
}

fn declaration_from_text(text: &str) -> Option<Declaration> {
    let mut input = ParserInput::new(text);
    let mut parser = Parser::new(&mut input);
    read_declaration(&mut parser).ok()
}

fn read_declaration<'i>(
    parser: &mut Parser<'i, '_>,
) -> Result<Declaration, CssParseError<'i, SyntaxError>> {
    let property = parser.expect_ident()?.to_string();
    parser.expect_colon()?;
    let start = parser.position();
    while parser.next_including_whitespace_and_comments().is_ok() {}
    let (value, important) = split_important_tail(parser.slice_from(start));
    Ok(Declaration {
        property,
        value,
        important,
    })
}

/// Split a trailing `!important` off a value, returning the value and the flag.
fn split_important_tail(value: &str) -> (String, bool) {
    let trimmed = value.trim();
    let lower = trimmed.to_ascii_lowercase();
    if let Some(head) = lower
        .strip_suffix("important")
        .map(str::trim_end)
        .and_then(|head| head.strip_suffix('!'))
    {
        return (trimmed[..head.len()].trim_end().to_string(), true);
    }
    (trimmed.to_string(), false)
}

fn to_location(location: SourceLocation) -> Location {
    Location {
        line: location.line + 1,
        column: location.column,
    }
}

pub(crate) fn custom_error<'i>(
    error: SyntaxError,
    location: SourceLocation,
) -> CssParseError<'i, SyntaxError> {
    CssParseError {
        kind: ParseErrorKind::Custom(error),
        location,
    }
}

pub(crate) fn error_message(kind: &ParseErrorKind<'_, SyntaxError>) -> String {
    match kind {
        ParseErrorKind::Custom(error) => error.to_string(),
        ParseErrorKind::Basic(BasicParseErrorKind::EndOfInput) => {
            "unexpected end of input".to_string()
        }
        ParseErrorKind::Basic(BasicParseErrorKind::UnexpectedToken(token)) => {
            format!("unexpected token {:?}", token)
        }
        ParseErrorKind::Basic(other) => format!("{:?}", other),
    }
}

pub(crate) fn convert_error(
    err: CssParseError<'_, SyntaxError>,
    source_name: Option<&str>,
) -> ParseError {
    let location = to_location(err.location);
    ParseError::new(error_message(&err.kind), location.line, location.column)
        .with_source_name(source_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::css_tree::{NodeKind, SelectorPart};

    fn raw_options() -> ParseOptions {
        ParseOptions {
            raw_at_rule_preludes: true,
            track_positions: true,
            source_name: Some("test.css".to_string()),
        }
    }

    fn kinds(sheet: &Stylesheet, parent: NodeId) -> Vec<NodeKind> {
        sheet
            .children(parent)
            .into_iter()
            .filter_map(|id| sheet.node(id).map(|node| node.kind.clone()))
            .collect()
    }

    #[test]
    fn parses_rule_with_declarations_and_apply() {
        let sheet = parse_stylesheet(
            ".a { color: red; @apply p-2 m-1; margin: 0 !important }",
            &raw_options(),
        )
        .expect("stylesheet should parse");
        let rules = sheet.children(sheet.root);
        assert_eq!(rules.len(), 1);

        let children = kinds(&sheet, rules[0]);
        assert_eq!(children.len(), 3);
        assert_eq!(
            children[0],
            NodeKind::Declaration(Declaration {
                property: "color".into(),
                value: "red".into(),
                important: false,
            })
        );
        match &children[1] {
            NodeKind::AtRule(at_rule) => {
                assert_eq!(at_rule.name, "apply");
                assert_eq!(at_rule.raw_prelude(), Some("p-2 m-1"));
                assert!(!at_rule.has_block);
            }
            other => panic!("expected @apply, got {:?}", other),
        }
        assert_eq!(
            children[2],
            NodeKind::Declaration(Declaration {
                property: "margin".into(),
                value: "0".into(),
                important: true,
            })
        );
    }

    #[test]
    fn structured_preludes_are_split_into_components() {
        let sheet = parse_stylesheet(".a { @apply  p-2   m-1; }", &ParseOptions::default())
            .expect("stylesheet should parse");
        let rule = sheet.children(sheet.root)[0];
        match &kinds(&sheet, rule)[0] {
            NodeKind::AtRule(at_rule) => {
                assert_eq!(at_rule.raw_prelude(), None);
                assert_eq!(
                    at_rule.prelude,
                    Some(AtRulePrelude::Components(vec!["p-2".into(), "m-1".into()]))
                );
            }
            other => panic!("expected at-rule, got {:?}", other),
        }
    }

    #[test]
    fn parses_nested_at_rules_and_selectors() {
        let sheet = parse_stylesheet(
            "@media (min-width: 640px) { .a > .b:hover, .c { display: flex } }",
            &raw_options(),
        )
        .expect("stylesheet should parse");
        let media = sheet.children(sheet.root)[0];
        let rule = sheet.children(media)[0];
        match &sheet.node(rule).map(|node| &node.kind) {
            Some(NodeKind::Rule(rule)) => {
                assert_eq!(rule.selectors.selectors.len(), 2);
                assert!(rule.selectors.selectors[0]
                    .parts
                    .contains(&SelectorPart::PseudoClass(":hover".into())));
            }
            other => panic!("expected rule, got {:?}", other),
        }
    }

    #[test]
    fn tracks_positions() {
        let sheet = parse_stylesheet("\n\n  .a {\n    @apply x;\n  }", &raw_options())
            .expect("stylesheet should parse");
        let rule = sheet.children(sheet.root)[0];
        let apply = sheet.children(rule)[0];
        assert_eq!(
            sheet.node(rule).and_then(|node| node.location),
            Some(Location { line: 3, column: 3 })
        );
        assert_eq!(
            sheet.node(apply).and_then(|node| node.location),
            Some(Location { line: 4, column: 5 })
        );
    }

    #[test]
    fn rejects_rule_without_block() {
        let err = parse_stylesheet(".a color: red;", &raw_options()).expect_err("should fail");
        assert_eq!(err.source_name.as_deref(), Some("test.css"));
        assert!(err.message.contains("expected '{'"), "{}", err.message);
    }

    #[test]
    fn rejects_stray_close_brace() {
        let err = parse_stylesheet(".a { color: red } }", &raw_options()).expect_err("should fail");
        assert!(err.message.contains("unexpected '}'"), "{}", err.message);
    }

    #[test]
    fn rejects_invalid_declaration() {
        let err = parse_stylesheet(".a { 12px: red }", &raw_options()).expect_err("should fail");
        assert!(err.message.contains("invalid declaration"), "{}", err.message);
    }

    #[test]
    fn parse_fragment_returns_detached_nodes() {
        let mut sheet = parse_stylesheet(".a {}", &raw_options()).expect("stylesheet should parse");
        let nodes = sheet
            .parse_fragment("@media print{.a{color:red}} .b{}")
            .expect("fragment should parse");
        assert_eq!(nodes.len(), 2);
        for node in &nodes {
            assert_eq!(sheet.parent(*node), None);
        }
        assert_eq!(sheet.children(sheet.root).len(), 1);
    }

    #[test]
    fn splits_declarations_on_top_level_semicolons() {
        assert_eq!(
            split_declarations("content:\";\";color:red;"),
            vec!["content:\";\"", "color:red"]
        );
        assert_eq!(split_declarations("a:b;;c:d"), vec!["a:b", "c:d"]);
        assert!(split_declarations("").is_empty());
    }

    #[test]
    fn keeps_blocks_that_end_a_prelude() {
        let sheet = parse_stylesheet(
            "@media (min-width: 640px){.a:not(.b){color:rgb(1 2 3)}}[data-x]{top:0;}",
            &raw_options(),
        )
        .expect("stylesheet should parse");
        let top = sheet.children(sheet.root);
        match &kinds(&sheet, sheet.root)[0] {
            NodeKind::AtRule(at_rule) => {
                assert_eq!(at_rule.raw_prelude(), Some("(min-width: 640px)"));
                assert!(at_rule.has_block);
            }
            other => panic!("expected @media, got {:?}", other),
        }
        let rule = sheet.children(top[0])[0];
        match &sheet.node(rule).map(|node| &node.kind) {
            Some(NodeKind::Rule(rule)) => assert_eq!(rule.selectors.to_string(), ".a:not(.b)"),
            other => panic!("expected rule, got {:?}", other),
        }
        assert_eq!(
            kinds(&sheet, rule),
            vec![NodeKind::Declaration(Declaration {
                property: "color".into(),
                value: "rgb(1 2 3)".into(),
                important: false,
            })]
        );
        match &sheet.node(top[1]).map(|node| &node.kind) {
            Some(NodeKind::Rule(rule)) => assert_eq!(rule.selectors.to_string(), "[data-x]"),
            other => panic!("expected rule, got {:?}", other),
        }
    }

    #[test]
    fn keeps_blocks_that_end_an_apply_prelude() {
        for css in [
            ".a { @apply p-4 hover:(underline); }",
            ".a { @apply p-4 hover:(underline) }",
        ] {
            let sheet = parse_stylesheet(css, &raw_options()).expect("stylesheet should parse");
            let rule = sheet.children(sheet.root)[0];
            match &kinds(&sheet, rule)[0] {
                NodeKind::AtRule(at_rule) => {
                    assert_eq!(at_rule.raw_prelude(), Some("p-4 hover:(underline)"))
                }
                other => panic!("expected @apply, got {:?}", other),
            }
        }
    }

    #[test]
    fn fragment_preludes_stay_literal() {
        let mut sheet = parse_stylesheet(".a {}", &raw_options()).expect("stylesheet should parse");
        let nodes = sheet
            .parse_fragment("@supports (content: \"a  b\"){.a{color:red}}")
            .expect("fragment should parse");
        match sheet.node(nodes[0]).map(|node| &node.kind) {
            Some(NodeKind::AtRule(at_rule)) => {
                assert_eq!(at_rule.raw_prelude(), Some("(content: \"a  b\")"))
            }
            other => panic!("expected @supports, got {:?}", other),
        }
    }

    #[test]
    fn splits_declarations_after_functions() {
        assert_eq!(
            split_declarations("color:rgb(1 2 3);margin:0;"),
            vec!["color:rgb(1 2 3)", "margin:0"]
        );
        assert_eq!(
            split_declarations("grid-area:a;width:calc(100% - var(--x))"),
            vec!["grid-area:a", "width:calc(100% - var(--x))"]
        );
        assert_eq!(split_declarations("content:attr(x)"), vec!["content:attr(x)"]);
    }

    #[test]
    fn parses_single_declarations() {
        let decl = parse_declaration(" --gap : calc(1rem + 2px) ").expect("should parse");
        assert_eq!(decl.property, "--gap");
        assert_eq!(decl.value, "calc(1rem + 2px)");
        assert!(!decl.important);

        let decl = parse_declaration("color:red ! IMPORTANT").expect("should parse");
        assert_eq!(decl.value, "red");
        assert!(decl.important);

        assert!(parse_declaration("not a declaration").is_err());
    }
}
