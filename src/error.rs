use thiserror::Error;

/// Errors returned when building a [`BTreeMap`](crate::BTreeMap) or its [`Config`](crate::Config).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The requested minimum degree is below [`MIN_DEGREE`](crate::MIN_DEGREE).
    #[error("invalid degree {degree}: a B-tree needs a minimum degree of at least 2")]
    InvalidDegree { degree: usize },
}
