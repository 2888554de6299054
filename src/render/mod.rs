//! Rendering collected metrics onto a fixed-size monochrome canvas.

pub mod canvas;
pub mod layout;
pub mod widgets;

pub use canvas::Frame;
pub use layout::{render_dashboard, RenderOptions};
pub use widgets::battery_fill_width;
