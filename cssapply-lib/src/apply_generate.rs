use crate::error::{ExpandError, ParseError};
use crate::minify::minify;
use crate::parser::{generate, parse_stylesheet, ParseOptions};
use crate::style::fragment::MergedFragment;
use crate::style::locator::{locate, Directive};
use crate::style::merger::merge;
use crate::style::resolver::UtilityResolver;
use crate::style::splicer::splice;
use log::debug;
use rayon::prelude::*;

pub mod css_apply {
    use super::*;

    /// Replace every `@apply` inside a style rule with the CSS its classes
    /// resolve to.
    ///
    /// Input without `@apply` is returned unchanged, without being parsed.
    pub fn expand<R>(
        css: &str,
        resolver: &R,
        source_name: Option<&str>,
    ) -> Result<String, ParseError>
    where
        R: UtilityResolver + ?Sized,
    {
        if !css.contains("@apply") {
            return Ok(css.to_string());
        }

        let options = ParseOptions {
            raw_at_rule_preludes: true,
            track_positions: true,
            source_name: source_name.map(str::to_string),
        };
        let mut sheet = parse_stylesheet(css, &options)?;

        let directives = locate(&sheet);
        debug!("found {} @apply directive(s)", directives.len());

        // Resolution only reads the resolver; the tree is edited afterwards on this thread.
        let merged: Vec<Vec<MergedFragment>> = directives
            .par_iter()
            .map(|directive| merge(&directive.payload, resolver))
            .collect();

        for (directive, fragments) in directives.iter().zip(&merged) {
            if fragments.is_empty() {
                log_unexpanded(directive);
                continue;
            }
            splice(&mut sheet, directive, fragments)?;
        }

        Ok(generate(&sheet))
    }

    /// [`expand`], then compress the result.
    pub fn expand_and_minify<R>(
        css: &str,
        resolver: &R,
        source_name: Option<&str>,
    ) -> Result<String, ExpandError>
    where
        R: UtilityResolver + ?Sized,
    {
        let expanded = expand(css, resolver, source_name)?;
        Ok(minify(&expanded, source_name)?)
    }
}

fn log_unexpanded(directive: &Directive) {
    match directive.location {
        Some(location) => debug!(
            "@apply {} at {}:{} matched nothing, leaving it in place",
            directive.payload, location.line, location.column
        ),
        None => debug!("@apply {} matched nothing, leaving it in place", directive.payload),
    }
}
