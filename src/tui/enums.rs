//! Enumerations for TUI state management.

use crate::planting::AreaRecord;
use crate::task::Task;

/// Application state for the terminal user interface.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum AppState {
    TaskList,
    TaskDetail,
    Assign,
    Planting,
    Areas,
    Help,
}

/// Input mode for text entry fields.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum InputMode {
    None,
    Search,
}

/// Blocking single-button message box.
#[derive(Clone, PartialEq, Debug)]
pub struct Alert {
    pub title: String,
    pub message: String,
}

impl Alert {
    pub fn error(message: impl Into<String>) -> Self {
        Alert { title: "Error".into(), message: message.into() }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Alert { title: "Success".into(), message: message.into() }
    }

    pub fn is_error(&self) -> bool {
        self.title == "Error"
    }
}

/// What a modal form asks the app to do after handling a key.
#[derive(Clone, PartialEq, Debug)]
pub enum FormAction {
    None,
    /// Show a blocking alert and stay on the form.
    Alert(Alert),
    /// Show a line in the status bar and stay on the form.
    Message(String),
    /// Confirmed assignments, to be prepended to the task store.
    Committed(Vec<Task>),
    /// A finished planting area.
    AreaFinished(AreaRecord),
    Cancelled,
}
