use thiserror::Error;

/// Problems with the caller-supplied table or column selection.
///
/// These are raised before any arithmetic runs. Public operations return them
/// wrapped in `anyhow::Error`; use `downcast_ref::<InputError>()` to match on
/// the variant.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InputError {
    #[error("Column '{0}' not found in table")]
    MissingColumn(String),

    #[error("Column '{0}' is not numeric")]
    NotNumeric(String),

    #[error("Column '{0}' is not categorical")]
    NotCategorical(String),

    #[error("Feature list cannot be empty")]
    EmptyFeatureList,

    #[error("Feature '{0}' is listed more than once")]
    DuplicateFeature(String),

    #[error("Grouping column '{column}' has {found} distinct group(s), at least 2 are required")]
    TooFewGroups { column: String, found: usize },

    #[error("Feature '{0}' has no observed values")]
    NoObservedValues(String),

    #[error("Table has no rows")]
    EmptyTable,

    #[error("Column '{column}' has {found} rows, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("Column '{0}' already exists")]
    DuplicateColumn(String),
}
