pub mod fragment;
pub mod locator;
pub mod merger;
pub mod resolver;
pub mod splicer;
pub mod utility_table;
