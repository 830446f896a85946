//! Canvas views and the small widgets around them.

pub mod activity_graph;
mod canvas;
mod error_overlay;
mod filter_bar;
pub mod globe;

pub use error_overlay::{ErrorOverlay, StaleBanner};
pub use filter_bar::{FilterBar, toggle_type};
