//! Interactive project timeline (Gantt) viewer built on egui.

pub mod app;
pub mod config;
pub mod error;
pub mod export;
pub mod model;
pub mod render;
pub mod source;
pub mod timeline;
pub mod view;

pub use app::TimelineApp;
pub use config::ViewerConfig;
pub use model::{Phase, ProjectRecord};
pub use view::ViewState;
