//! Interactive front-end: preview window widgets and the save prompt.

pub mod panels;
pub mod plot;
pub mod prompt;

pub use prompt::{Confirm, DialogConfirm, TerminalConfirm};
