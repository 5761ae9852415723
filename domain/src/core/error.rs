//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Taxonomy must contain at least one category")]
    EmptyTaxonomy,

    #[error("Category name cannot be empty")]
    EmptyCategoryName,

    #[error("Duplicate category name: {0}")]
    DuplicateCategory(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_category_display() {
        let error = DomainError::DuplicateCategory("Snow".to_string());
        assert_eq!(error.to_string(), "Duplicate category name: Snow");
    }
}
