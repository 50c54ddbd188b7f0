pub mod apply_generate;
pub mod ast;
pub mod config;
pub mod error;
pub mod minify;
pub mod parser;
pub mod style;

pub use apply_generate::css_apply::{expand, expand_and_minify};
pub use error::{ConfigError, ExpandError, MinifyError, ParseError};
pub use style::resolver::UtilityResolver;
pub use style::utility_table::UtilityTable;
