#[derive(Debug, Clone, PartialEq)]
pub enum DomainError {
    InvalidManifest(String),
    FileUnavailable(String),
    MissingInclude { header: String, included_by: String },
    UnknownProfile { name: String, known: Vec<String> },
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DomainError::InvalidManifest(msg) => {
                write!(f, "invalid manifest: {}", msg)
            }
            DomainError::FileUnavailable(msg) => {
                write!(f, "file unavailable: {}", msg)
            }
            DomainError::MissingInclude { header, included_by } => {
                write!(f, "cannot resolve #include \"{}\" requested by {}", header, included_by)
            }
            DomainError::UnknownProfile { name, known } => {
                write!(
                    f,
                    "unknown profile '{}', known profiles: {}",
                    name,
                    known.join(", ")
                )
            }
        }
    }
}

impl std::error::Error for DomainError {}

pub type DomainResult<T> = Result<T, DomainError>;
