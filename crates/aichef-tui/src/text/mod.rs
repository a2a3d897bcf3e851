//! Text rendering utilities.
//!
//! - [`markdown`]: assistant text to styled lines
//! - [`styles`]: markdown element styles
//! - [`wrap`]: width-aware wrapping that keeps styling
//! - [`width`]: terminal cell widths and truncation

pub mod markdown;
pub mod styles;
pub mod width;
pub mod wrap;

pub use markdown::render_markdown;
pub use width::{truncate_to_width, visual_width};
pub use wrap::wrap_lines;
