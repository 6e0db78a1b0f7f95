//! Reusable UI components.

mod action_menu;
mod help_bar;
mod input;
mod loading;
mod modal;
mod notification;
mod table;
mod tag_dialog;

pub use action_menu::{ActionMenu, MenuInput};
pub use help_bar::render_context_help;
pub use input::TextInput;
pub use loading::LoadingIndicator;
pub use modal::{centered_rect, ErrorDialog};
pub use notification::{Level, Notification, NotificationManager};
pub use table::{TableInput, TableView};
pub use tag_dialog::{TagDialogView, TagInput};
