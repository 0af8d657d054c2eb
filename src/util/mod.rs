//! Utility functions for common operations.
//!
//! - **URL normalization**: canonical links and the article ids derived from them
//! - **Text processing**: title cleanup, markdown escaping, headline keywords

mod link;
mod text;

pub use self::link::{article_id, normalize_url};
pub use self::text::{clean_title, escape_link_text, extract_keywords, keyword_similarity};
