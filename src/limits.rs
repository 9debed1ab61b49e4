/// Longest reservation comment, in characters.
pub const MAX_COMMENT_LEN: usize = 1000;

/// Longest name, address, email or room label accepted by the store.
pub const MAX_TEXT_LEN: usize = 255;

pub const DEFAULT_PAGE: usize = 0;
pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const MAX_PAGE_SIZE: usize = 1000;
