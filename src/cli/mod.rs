pub mod commands;
pub mod render;
pub mod ui;

pub use render::{OutputFormat, render, write_output};
pub use ui::Output;
