use std::{fmt, path::PathBuf};

/// Failure to read a document or one of the files it imports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadingError {
    pub problem: String,
    pub details: String,
    pub filename: PathBuf,
}

impl fmt::Display for LoadingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self
            .details
            .is_empty()
        {
            write!(f, "{}", self.problem)
        } else {
            write!(f, "{}: {}", self.problem, self.details)
        }
    }
}
