//! Error types for plantation operations.
//!
//! The only domain failure is a [`ValidationError`]: a form was submitted
//! with required fields left empty. Everything else is plumbing (I/O, seed
//! parsing, unknown ids typed on the command line).

/// Which form rejected a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    Assignment,
    Phase,
    Block,
    Tree,
}

impl FormKind {
    pub fn label(self) -> &'static str {
        match self {
            FormKind::Assignment => "task assignment",
            FormKind::Phase => "phase",
            FormKind::Block => "block",
            FormKind::Tree => "tree",
        }
    }
}

/// Required field(s) were empty at the point of submission.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{} form incomplete: {}", .form.label(), self.message())]
pub struct ValidationError {
    pub form: FormKind,
    pub missing: Vec<&'static str>,
}

impl ValidationError {
    pub fn new(form: FormKind, missing: Vec<&'static str>) -> Self {
        ValidationError { form, missing }
    }

    /// Message shown in the blocking alert.
    ///
    /// Forms report in general terms; only the block form names the fields
    /// that are still empty.
    pub fn message(&self) -> String {
        match self.form {
            FormKind::Assignment => {
                "Please complete all task details and select at least one worker.".to_string()
            }
            FormKind::Block if !self.missing.is_empty() => {
                format!("Please fill in all fields. Missing: {}", self.missing.join(", "))
            }
            _ => "Please fill in all fields".to_string(),
        }
    }
}

/// Crate-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for plantation operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assignment_message_is_general() {
        let err = ValidationError::new(FormKind::Assignment, vec!["Area / Block"]);
        assert_eq!(
            err.message(),
            "Please complete all task details and select at least one worker."
        );
    }

    #[test]
    fn test_block_message_names_fields() {
        let err = ValidationError::new(FormKind::Block, vec!["Soil Type", "Slope (%)"]);
        assert_eq!(err.message(), "Please fill in all fields. Missing: Soil Type, Slope (%)");
        let wrapped: Error = err.into();
        assert!(wrapped.to_string().contains("block form incomplete"));
    }

    #[test]
    fn test_tree_and_phase_messages_are_general() {
        let tree = ValidationError::new(FormKind::Tree, vec!["Tag ID", "Disease"]);
        assert_eq!(tree.message(), "Please fill in all fields");
        assert!(!tree.to_string().contains("Tag ID"));
        assert_eq!(tree.to_string(), "tree form incomplete: Please fill in all fields");

        let phase = ValidationError::new(FormKind::Phase, vec!["Phase Name"]);
        assert_eq!(phase.message(), "Please fill in all fields");
        assert_eq!(phase.missing, vec!["Phase Name"]);
    }
}
