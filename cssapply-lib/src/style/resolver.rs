use crate::style::fragment::UtilityFragment;
use regex::{Captures, Regex};
use std::sync::{Arc, OnceLock};

/// Turns utility class names into CSS fragments.
///
/// Implementations are shared across the rayon pool, so they must be `Sync`.
/// Returned fragments may come from a cache and are never mutated by callers.
pub trait UtilityResolver: Sync {
    /// Resolve one class name. `alias` is the class used in generated
    /// selectors. Returns `None` when the class is unknown.
    fn resolve(&self, class_name: &str, alias: &str) -> Option<Arc<[UtilityFragment]>>;

    /// Flatten variant-group shorthand into space-separated class names.
    fn expand_variant_groups(&self, payload: &str) -> String {
        expand_variant_groups(payload)
    }
}

impl<R: UtilityResolver + ?Sized> UtilityResolver for &R {
    fn resolve(&self, class_name: &str, alias: &str) -> Option<Arc<[UtilityFragment]>> {
        (**self).resolve(class_name, alias)
    }

    fn expand_variant_groups(&self, payload: &str) -> String {
        (**self).expand_variant_groups(payload)
    }
}

fn variant_group_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"([!@\w+:_/.\[\]&-]+?)([:-])\(([^()]*)\)")
            .expect("variant group pattern is valid")
    })
}

/// Expand `hover:(a b)` into `hover:a hover:b` and `text-(red lg)` into
/// `text-red text-lg`. Groups nest; `~` inside a group stands for the bare
/// prefix.
pub fn expand_variant_groups(payload: &str) -> String {
    let pattern = variant_group_pattern();
    let mut current = payload.to_string();
    loop {
        let next = pattern
            .replace_all(&current, |caps: &Captures| {
                let prefix = &caps[1];
                let separator = &caps[2];
                caps[3]
                    .split_whitespace()
                    .map(|item| {
                        if item == "~" {
                            prefix.to_string()
                        } else {
                            format!("{}{}{}", prefix, separator, item)
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .into_owned();
        if next == current {
            return current;
        }
        current = next;
    }
}
