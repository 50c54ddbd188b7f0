use crate::ast::css_tree::{Combinator, Selector, SelectorList, SelectorPart};
use crate::error::ParseError;
use crate::parser::css::{convert_error, skip_block, SyntaxError};
use cssparser::{ParseError as CssParseError, Parser, ParserInput, Token};

/// Parse a comma-separated selector list.
pub fn parse_selector_list(selector: &str) -> Result<SelectorList, ParseError> {
    let mut input = ParserInput::new(selector);
    let mut parser = Parser::new(&mut input);
    read_selector_list(&mut parser).map_err(|err| convert_error(err, None))
}

pub(crate) fn read_selector_list<'i>(
    parser: &mut Parser<'i, '_>,
) -> Result<SelectorList, CssParseError<'i, SyntaxError>> {
    let mut list = SelectorList::default();
    let mut current = Selector::default();
    let mut pending_space = false;

    loop {
        let start = parser.position();
        let token = match parser.next_including_whitespace_and_comments() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };

        match token {
            Token::WhiteSpace(_) => pending_space = true,
            Token::Comment(_) => {}
            Token::Comma => {
                list.selectors.push(finish(parser, current)?);
                current = Selector::default();
                pending_space = false;
            }
            Token::Delim(delim @ ('>' | '+' | '~')) => {
                let combinator = match delim {
                    '>' => Combinator::Child,
                    '+' => Combinator::NextSibling,
                    _ => Combinator::SubsequentSibling,
                };
                if let Some(SelectorPart::Combinator(Combinator::Descendant)) = current.parts.last()
                {
                    current.parts.pop();
                }
                current.parts.push(SelectorPart::Combinator(combinator));
                pending_space = false;
            }
            Token::Colon => {
                let part = read_pseudo(parser, start)?;
                push_part(&mut current, part, &mut pending_space);
            }
            Token::Function(_) | Token::SquareBracketBlock | Token::ParenthesisBlock => {
                skip_block(parser)?;
                let part = SelectorPart::Simple(parser.slice_from(start).to_string());
                push_part(&mut current, part, &mut pending_space);
            }
            _ => {
                let part = SelectorPart::Simple(parser.slice_from(start).to_string());
                push_part(&mut current, part, &mut pending_space);
            }
        }
    }

    list.selectors.push(finish(parser, current)?);
    Ok(list)
}

/// `:name`, `:name(...)`, `::name` or `::name(...)`; the leading colon is already consumed.
fn read_pseudo<'i>(
    parser: &mut Parser<'i, '_>,
    start: cssparser::SourcePosition,
) -> Result<SelectorPart, CssParseError<'i, SyntaxError>> {
    let mut element = false;
    let mut token = parser.next_including_whitespace_and_comments()?.clone();
    if token == Token::Colon {
        element = true;
        token = parser.next_including_whitespace_and_comments()?.clone();
    }

    match token {
        Token::Ident(_) => {}
        Token::Function(_) => skip_block(parser)?,
        _ => return Err(parser.new_custom_error(SyntaxError::ExpectedPseudoName)),
    }

    let raw = parser.slice_from(start).to_string();
    Ok(if element {
        SelectorPart::PseudoElement(raw)
    } else {
        SelectorPart::PseudoClass(raw)
    })
}

fn push_part(selector: &mut Selector, part: SelectorPart, pending_space: &mut bool) {
    let after_compound = matches!(
        selector.parts.last(),
        Some(
            SelectorPart::Simple(_) | SelectorPart::PseudoClass(_) | SelectorPart::PseudoElement(_)
        )
    );
    if *pending_space && after_compound {
        selector
            .parts
            .push(SelectorPart::Combinator(Combinator::Descendant));
    }
    *pending_space = false;

    // `.a` tokenizes as a delimiter and an identifier; keep compound text together.
    if let (SelectorPart::Simple(text), Some(SelectorPart::Simple(last))) =
        (&part, selector.parts.last_mut())
    {
        last.push_str(text);
        return;
    }
    selector.parts.push(part);
}

fn finish<'i>(
    parser: &Parser<'i, '_>,
    selector: Selector,
) -> Result<Selector, CssParseError<'i, SyntaxError>> {
    match selector.parts.last() {
        None => Err(parser.new_custom_error(SyntaxError::EmptySelector)),
        Some(SelectorPart::Combinator(_)) => {
            Err(parser.new_custom_error(SyntaxError::DanglingCombinator))
        }
        Some(_) => Ok(selector),
    }
}
