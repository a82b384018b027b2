pub mod index;
pub mod page;
pub mod region;

pub use index::ensure_index_link;
pub use page::{ensure_category_page, write_cards};
