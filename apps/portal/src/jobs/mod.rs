// Job search: facet state, persisted preferences, and the listing board.

pub mod board;
pub mod filters;
pub mod handlers;
pub mod preferences;

pub use board::JobBoard;
