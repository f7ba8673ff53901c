//! Query text handling
//!
//! Column membership and column toggling over free-form query text typed
//! by the user. Nothing here parses or validates SQL; only the select list
//! is given structure.

pub mod column_toggle;
pub mod membership;
pub mod select_lexer;

pub use column_toggle::{insert_column, normalize_query_text, remove_column, toggle_column};
pub use membership::resolve_membership;
pub use select_lexer::select_items;
