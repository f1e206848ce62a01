use thiserror::Error;

/// Rejected edits to a panel
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("row {index} out of range ({len} rows)")]
    RowOutOfRange { index: usize, len: usize },
    #[error("unknown attribute '{0}'")]
    UnknownAttribute(String),
    #[error("'{value}' is not a legal value of '{attribute}'")]
    IllegalValue { attribute: String, value: String },
    #[error("row {0} has no attribute selected")]
    NoAttribute(usize),
    #[error("unknown annotation dataset '{0}'")]
    UnknownAnnotation(String),
    #[error("filter row {0} has no annotation dataset to compare against")]
    NoReference(usize),
    #[error("{op} is not offered for this panel")]
    ReductionNotOffered { op: String },
}

/// Requests that cannot be assembled from the current form state
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("no value selected for attribute '{attribute}'")]
    EmptySelection { attribute: String },
    #[error("an upload needs a URL")]
    MissingUploadUrl,
    #[error("a job id is required to fetch a result")]
    MissingJobId,
}
