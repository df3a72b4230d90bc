/// Errors raised while parsing or rendering a [`Template`](crate::template::Template).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("Invalid placeholder in template: line {line}, col {column}")]
    InvalidPlaceholder { line: usize, column: usize },

    #[error("Missing value for template identifier '{0}'")]
    MissingIdentifier(String),

    #[error("Template has no source text")]
    MissingSource,

    #[error("Unrecognized group in placeholder pattern at offset {offset}")]
    UnrecognizedGroup { offset: usize },
}

impl TemplateError {
    /// The identifier a strict substitution could not resolve, if that is the failure.
    pub fn missing_identifier(&self) -> Option<&str> {
        match self {
            Self::MissingIdentifier(name) => Some(name),
            _ => None,
        }
    }
}

/// Errors raised while building a [`Params`](crate::params::Params) mapping from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParamsError {
    #[error("Expected a name=value assignment, got '{0}'")]
    NotAnAssignment(String),

    #[error("Invalid parameter name '{0}'")]
    InvalidName(String),
}
