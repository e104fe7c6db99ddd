//! UI layer: the panel window and the gauge painter.

pub mod app;
pub mod gauge;

pub use app::PanelApp;
