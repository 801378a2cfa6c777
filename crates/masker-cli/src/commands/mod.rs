pub mod mask;
pub mod process;
pub mod serve;

use masker_core::{Label, MANDATORY_NUMERIC_SCHEMA, OPTIONAL_SEMANTIC_SCHEMA};

/// Requested labels plus custom ones; no request means every built-in label
pub fn resolve_labels(labels: &[String], custom: &str) -> Vec<Label> {
    let selected: Vec<Label> = if labels.is_empty() {
        MANDATORY_NUMERIC_SCHEMA
            .iter()
            .chain(OPTIONAL_SEMANTIC_SCHEMA.iter())
            .map(|name| Label::from_name(name))
            .collect()
    } else {
        labels
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(Label::from_name)
            .collect()
    };

    Label::merge_custom(&selected, custom)
}
