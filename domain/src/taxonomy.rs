//! Precipitation category taxonomy and response parsing.
//!
//! The taxonomy is the single vocabulary shared by the two halves of a
//! labeling run: its categories are enumerated (in order) in the prompt sent
//! to the model, and the same ordered list is scanned when the model's
//! free-text answer is mapped back onto one discrete label.

use crate::core::error::DomainError;

/// Sentinel label assigned when no category matches the response.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// A precipitation category: a short name plus the definition text shown to
/// the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    pub definition: String,
}

impl Category {
    pub fn new(name: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            definition: definition.into(),
        }
    }
}

/// Ordered collection of categories (Value Object)
///
/// Order matters twice: it defines prompt enumeration order, and it defines
/// first-match priority when parsing a response. Names are unique
/// case-insensitively.
#[derive(Debug, Clone)]
pub struct CategoryTaxonomy {
    categories: Vec<Category>,
}

impl CategoryTaxonomy {
    pub fn new(categories: Vec<Category>) -> Result<Self, DomainError> {
        if categories.is_empty() {
            return Err(DomainError::EmptyTaxonomy);
        }
        let mut seen: Vec<String> = Vec::with_capacity(categories.len());
        for category in &categories {
            let name = category.name.trim();
            if name.is_empty() {
                return Err(DomainError::EmptyCategoryName);
            }
            let lower = name.to_lowercase();
            if seen.contains(&lower) {
                return Err(DomainError::DuplicateCategory(category.name.clone()));
            }
            seen.push(lower);
        }
        Ok(Self { categories })
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Case-insensitive membership test on category names.
    pub fn contains(&self, name: &str) -> bool {
        self.categories
            .iter()
            .any(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Map a raw model response onto a category label.
    ///
    /// Only the last newline-delimited line of the trimmed response is
    /// considered. Categories are scanned in insertion order and the first
    /// one whose lower-cased name is a substring of that line wins: first
    /// match, not longest match. No match yields [`UNKNOWN_LABEL`]. A
    /// trailing period is stripped from the chosen label before it is
    /// returned.
    pub fn parse_response(&self, raw: &str) -> String {
        let last_line = raw.trim().lines().last().unwrap_or("").to_lowercase();

        let mut label = self
            .categories
            .iter()
            .find(|c| last_line.contains(&c.name.to_lowercase()))
            .map(|c| c.name.clone())
            .unwrap_or_else(|| UNKNOWN_LABEL.to_string());

        if label.ends_with('.') {
            label.pop();
        }
        label.trim().to_string()
    }
}

impl Default for CategoryTaxonomy {
    /// The built-in precipitation taxonomy for base-reflectivity imagery.
    fn default() -> Self {
        Self::new(vec![
            Category::new(
                "No precipitation",
                "Clear air, ground clutter, or noise only; no coherent precipitation echoes.",
            ),
            Category::new(
                "Stratiform rain",
                "Widespread, relatively uniform rain with smooth reflectivity gradients, often showing a bright band.",
            ),
            Category::new(
                "Snow",
                "Broad regions of weak to moderate reflectivity typical of frozen precipitation.",
            ),
            Category::new(
                "Scattered convection",
                "Isolated convective cells with compact high-reflectivity cores scattered across the domain.",
            ),
            Category::new(
                "Linear convection",
                "A continuous line or arc of strong convective echoes, such as a squall line.",
            ),
            Category::new(
                "Supercells",
                "Discrete, intense cells with very high reflectivity cores and possible hook echo signatures.",
            ),
        ])
        .expect("built-in taxonomy is valid")
    }
}
