use crate::error::ConfigError;
use serde::Deserialize;
use std::fs;
use std::path::Path;

const DEFAULT_UTILITIES_TOML: &str = include_str!("default_utilities.toml");

/// Utility table definition, usually read from a TOML file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
pub struct Config {
    #[serde(default, rename = "utility")]
    pub utilities: Vec<UtilityDef>,
    #[serde(default, rename = "shortcut")]
    pub shortcuts: Vec<ShortcutDef>,
    #[serde(default)]
    pub variants: VariantConfig,
}

/// A utility class and its declarations. Earlier entries sort first in the cascade.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UtilityDef {
    pub name: String,
    pub body: String,
}

/// A class that stands for a list of other classes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ShortcutDef {
    pub name: String,
    pub expands: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VariantConfig {
    #[serde(default = "default_pseudo_variants")]
    pub pseudo: Vec<PseudoVariantDef>,
    #[serde(default = "default_breakpoints")]
    pub breakpoints: Vec<BreakpointDef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PseudoVariantDef {
    pub name: String,
    /// Pseudo-class text appended to the selector, e.g. `:hover`.
    pub selector: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BreakpointDef {
    pub name: String,
    pub min_width: String,
}

pub fn load(path: &Path) -> Result<Config, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// The utility table bundled with the crate.
pub fn builtin() -> Result<Config, ConfigError> {
    Ok(toml::from_str(DEFAULT_UTILITIES_TOML)?)
}

impl Default for VariantConfig {
    fn default() -> Self {
        Self {
            pseudo: default_pseudo_variants(),
            breakpoints: default_breakpoints(),
        }
    }
}

fn default_pseudo_variants() -> Vec<PseudoVariantDef> {
    [
        ("hover", ":hover"),
        ("focus", ":focus"),
        ("focus-visible", ":focus-visible"),
        ("focus-within", ":focus-within"),
        ("active", ":active"),
        ("visited", ":visited"),
        ("disabled", ":disabled"),
        ("checked", ":checked"),
        ("first", ":first-child"),
        ("last", ":last-child"),
        ("odd", ":nth-child(odd)"),
        ("even", ":nth-child(even)"),
    ]
    .into_iter()
    .map(|(name, selector)| PseudoVariantDef {
        name: name.to_string(),
        selector: selector.to_string(),
    })
    .collect()
}

fn default_breakpoints() -> Vec<BreakpointDef> {
    [
        ("sm", "640px"),
        ("md", "768px"),
        ("lg", "1024px"),
        ("xl", "1280px"),
        ("2xl", "1536px"),
    ]
    .into_iter()
    .map(|(name, min_width)| BreakpointDef {
        name: name.to_string(),
        min_width: min_width.to_string(),
    })
    .collect()
}
