//! Desktop driver for `tour_nav`.
//!
//! Loads a JSON scene, feeds winit input into a [`tour_nav::TourController`]
//! and reports the tour state in the window title. Nothing is rendered.

pub mod app;
pub mod config;
pub mod input;
pub mod scene;
