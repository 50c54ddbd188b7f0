use crate::style::fragment::{MergedFragment, UtilityFragment};
use crate::style::resolver::UtilityResolver;
use log::debug;
use rayon::prelude::*;
use std::sync::Arc;

/// Alias passed to the resolver, so plain utilities come back with the
/// empty-selector sentinel.
pub const RESOLVE_ALIAS: &str = "-";

/// Resolve every class named in an `@apply` payload and merge the results.
///
/// Lookups run concurrently. Unknown classes are dropped. An empty result means
/// nothing should be spliced.
pub fn merge<R>(payload: &str, resolver: &R) -> Vec<MergedFragment>
where
    R: UtilityResolver + ?Sized,
{
    let expanded = resolver.expand_variant_groups(payload);
    let class_names: Vec<&str> = expanded.split_whitespace().collect();

    let resolved: Vec<Arc<[UtilityFragment]>> = class_names
        .par_iter()
        .filter_map(|class_name| {
            let found = resolver.resolve(class_name, RESOLVE_ALIAS);
            if found.is_none() {
                debug!("no utility matches `{}`", class_name);
            }
            found
        })
        .collect();

    let mut fragments: Vec<&UtilityFragment> =
        resolved.iter().flat_map(|found| found.iter()).collect();
    fragments.sort_by_key(|fragment| fragment.priority);
    fold(fragments)
}

/// Group fragments by selector and parent, concatenating bodies in order.
/// Groups are ordered by their first member.
pub fn fold<'a, I>(fragments: I) -> Vec<MergedFragment>
where
    I: IntoIterator<Item = &'a UtilityFragment>,
{
    let mut merged: Vec<MergedFragment> = Vec::new();
    for fragment in fragments {
        match merged.iter_mut().find(|entry| entry.same_target(fragment)) {
            Some(entry) => entry.append_body(&fragment.body),
            None => merged.push(MergedFragment::from(fragment)),
        }
    }
    merged
}
