//! Horizon application: window, input and the headless runner around the
//! sky scene.

pub mod app;
pub mod controls;
pub mod headless;
pub mod input;
pub mod settings;
