//! Prompt template for radar image classification.

use crate::dataset::record::TIME_FORMAT;
use crate::taxonomy::CategoryTaxonomy;
use chrono::NaiveDateTime;

/// Builds the classification prompt sent with every image of a run.
///
/// The base prompt restates the imaging context (radar site, colorbar value
/// range) and enumerates every category with its definition in taxonomy
/// order. A short per-image suffix carries the scan timestamp and pins the
/// answer format down to a bare category name.
#[derive(Debug, Clone)]
pub struct LabelPromptTemplate {
    site: String,
    value_range: (i32, i32),
}

impl LabelPromptTemplate {
    pub fn new(site: impl Into<String>, value_range: (i32, i32)) -> Self {
        Self {
            site: site.into(),
            value_range,
        }
    }

    pub fn site(&self) -> &str {
        &self.site
    }

    /// Render the shared base prompt for a run.
    pub fn render(&self, taxonomy: &CategoryTaxonomy) -> String {
        let (vmin, vmax) = self.value_range;
        let mut prompt = String::from("This is an image of weather radar base reflectivity data");
        if !self.site.is_empty() {
            prompt.push_str(&format!(" from radar site {}", self.site));
        }
        prompt.push_str(&format!(
            ". The colorbar ranges from {vmin} to {vmax} dBZ. \
             Classify the weather depicted into one of the following categories:\n"
        ));
        for category in taxonomy.categories() {
            prompt.push_str(&format!("- {}: {}\n", category.name, category.definition));
        }
        prompt
    }

    /// Render the per-image suffix appended below the base prompt.
    pub fn image_suffix(&self, time: &NaiveDateTime) -> String {
        format!(
            "The image was captured at {}. Answer with only the category name, \
             with no reasoning or additional text.",
            time.format(TIME_FORMAT)
        )
    }
}
