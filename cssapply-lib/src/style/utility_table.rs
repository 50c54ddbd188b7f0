use crate::config::Config;
use crate::style::fragment::UtilityFragment;
use crate::style::resolver::{expand_variant_groups, UtilityResolver};
use dashmap::DashMap;
use log::trace;
use std::collections::HashMap;
use std::sync::Arc;

/// Guards against shortcuts that expand to themselves.
const MAX_SHORTCUT_DEPTH: usize = 8;

#[derive(Debug, Clone)]
struct Utility {
    priority: u32,
    body: String,
}

#[derive(Debug, Clone)]
struct PseudoVariant {
    selector: String,
    offset: u32,
}

#[derive(Debug, Clone)]
struct Breakpoint {
    wrapper: String,
    offset: u32,
}

type CacheKey = (String, String);

/// A [`UtilityResolver`] backed by a [`Config`].
///
/// Class names take the form `variant:variant:base`. Results are memoized per
/// class and alias; the memo is shared by every thread resolving through this table.
#[derive(Debug, Default)]
pub struct UtilityTable {
    utilities: HashMap<String, Utility>,
    shortcuts: HashMap<String, Vec<String>>,
    pseudo_variants: HashMap<String, PseudoVariant>,
    breakpoints: HashMap<String, Breakpoint>,
    cache: DashMap<CacheKey, Option<Arc<[UtilityFragment]>>>,
}

impl UtilityTable {
    pub fn from_config(config: &Config) -> Self {
        let (pseudo_step, breakpoint_step) = priority_steps(config);

        let utilities = config
            .utilities
            .iter()
            .enumerate()
            .map(|(index, def)| {
                let mut body = def.body.trim().to_string();
                if !body.is_empty() && !body.ends_with(';') {
                    body.push(';');
                }
                let utility = Utility {
                    priority: index as u32,
                    body,
                };
                (def.name.clone(), utility)
            })
            .collect();

        let shortcuts = config
            .shortcuts
            .iter()
            .map(|def| {
                let members = expand_variant_groups(&def.expands)
                    .split_whitespace()
                    .map(str::to_string)
                    .collect();
                (def.name.clone(), members)
            })
            .collect();

        let pseudo_variants = config
            .variants
            .pseudo
            .iter()
            .enumerate()
            .map(|(rank, def)| {
                let variant = PseudoVariant {
                    selector: def.selector.clone(),
                    offset: (rank as u32 + 1).saturating_mul(pseudo_step),
                };
                (def.name.clone(), variant)
            })
            .collect();

        let breakpoints = config
            .variants
            .breakpoints
            .iter()
            .enumerate()
            .map(|(rank, def)| {
                let breakpoint = Breakpoint {
                    wrapper: format!("@media (min-width: {})", def.min_width),
                    offset: (rank as u32 + 1).saturating_mul(breakpoint_step),
                };
                (def.name.clone(), breakpoint)
            })
            .collect();

        UtilityTable {
            utilities,
            shortcuts,
            pseudo_variants,
            breakpoints,
            cache: DashMap::new(),
        }
    }

    /// Number of memoized lookups, hits and misses alike.
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    fn resolve_uncached(
        &self,
        class_name: &str,
        alias: &str,
        depth: usize,
    ) -> Option<Vec<UtilityFragment>> {
        let (variants, base) = match class_name.rsplit_once(':') {
            Some((variants, base)) => (Some(variants), base),
            None => (None, class_name),
        };

        if let Some(members) = self.shortcuts.get(base) {
            if depth >= MAX_SHORTCUT_DEPTH {
                trace!("shortcut `{}` nests too deeply", class_name);
                return None;
            }
            let prefix = &class_name[..class_name.len() - base.len()];
            let fragments: Vec<UtilityFragment> = members
                .iter()
                .filter_map(|member| {
                    self.resolve_uncached(&format!("{}{}", prefix, member), alias, depth + 1)
                })
                .flatten()
                .collect();
            return (!fragments.is_empty()).then_some(fragments);
        }

        let utility = self.utilities.get(base)?;
        let mut priority = utility.priority;
        let mut pseudo = String::new();
        let mut wrapper: Option<&str> = None;

        for variant in variants.into_iter().flat_map(|v| v.split(':')) {
            if let Some(variant) = self.pseudo_variants.get(variant) {
                pseudo.push_str(&variant.selector);
                priority = priority.saturating_add(variant.offset);
            } else if let Some(breakpoint) = self.breakpoints.get(variant) {
                if wrapper.is_some() {
                    trace!("`{}` combines more than one breakpoint", class_name);
                    return None;
                }
                wrapper = Some(breakpoint.wrapper.as_str());
                priority = priority.saturating_add(breakpoint.offset);
            } else {
                trace!("unknown variant `{}` in `{}`", variant, class_name);
                return None;
            }
        }

        let mut selector = String::from(".");
        cssparser::serialize_identifier(alias, &mut selector).ok()?;
        selector.push_str(&pseudo);

        Some(vec![UtilityFragment::new(
            priority,
            Some(selector.as_str()),
            &utility.body,
            wrapper,
        )])
    }
}

/// Offsets per pseudo rank and per breakpoint rank.
///
/// Every plain priority is below the first pseudo offset, and every
/// combination of distinct pseudo variants is below the first breakpoint
/// offset, so `hover:` output follows plain output and wrapped output comes last.
fn priority_steps(config: &Config) -> (u32, u32) {
    let pseudo_step = u32::try_from(config.utilities.len())
        .unwrap_or(u32::MAX)
        .max(1);
    let pseudo_count = u32::try_from(config.variants.pseudo.len()).unwrap_or(u32::MAX);
    let rank_sum = pseudo_count.saturating_mul(pseudo_count.saturating_add(1)) / 2;
    let breakpoint_step = pseudo_step.saturating_mul(rank_sum.saturating_add(1));
    (pseudo_step, breakpoint_step)
}

impl UtilityResolver for UtilityTable {
    fn resolve(&self, class_name: &str, alias: &str) -> Option<Arc<[UtilityFragment]>> {
        let key = (class_name.to_string(), alias.to_string());
        if let Some(hit) = self.cache.get(&key) {
            return hit.value().clone();
        }

        let resolved: Option<Arc<[UtilityFragment]>> =
            self.resolve_uncached(class_name, alias, 0).map(Arc::from);
        self.cache.insert(key, resolved.clone());
        resolved
    }
}
