pub mod css;
pub mod printer;
pub mod selector;

pub use css::{parse_declaration, parse_stylesheet, split_declarations, ParseContext, ParseOptions};
pub use printer::generate;
pub use selector::parse_selector_list;
