pub mod aggregate;
pub mod calendar;
pub mod canvas;
pub mod color;
pub mod config;
pub mod error;
pub mod heatmap;
pub mod source;
