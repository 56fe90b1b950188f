//! Desktop host for the Terra globe: a winit window with a scrollable page
//! around the globe's hero section.

pub mod app;
pub mod page;

pub use app::{AppError, TerraApp, run, viewport_for, window_attributes_from_config};
pub use page::PageScroll;
