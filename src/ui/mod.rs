//! User interface components and views.
//!
//! This module contains all TUI rendering logic, including views for the
//! screens and reusable UI components.

pub mod components;
pub mod theme;
pub mod views;

pub use components::{
    render_context_help, ErrorDialog, Level, LoadingIndicator, NotificationManager, TextInput,
};
pub use views::{Effect, Screen};
