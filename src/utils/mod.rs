pub(crate) mod terminal;

// Public API - utilities used by commands
pub use terminal::{set_terminal_title, set_terminal_title_and_flush, sync_indicator};
