use std::fmt;

/// Which side of the join an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dataset {
    Tabular,
    Layer,
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tabular => write!(f, "tabular dataset"),
            Self::Layer => write!(f, "layer"),
        }
    }
}

#[derive(Debug)]
pub enum JoinError {
    /// A requested join key does not exist in its dataset.
    MissingColumn { dataset: Dataset, column: String },
    /// IO error (file read, malformed input, etc.).
    Io(String),
}

impl fmt::Display for JoinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingColumn { dataset, column } => {
                write!(f, "{dataset}: missing column '{column}'")
            }
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for JoinError {}
