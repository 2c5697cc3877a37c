//! Reusable presentation pieces

pub mod keybindings;
