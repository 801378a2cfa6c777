//! Merging regex hits with model hits, plus the global literal re-scan

use masker_core::{CharIndex, EntitySpan, Label, Method};
use regex::RegexBuilder;
use std::collections::HashMap;

/// Entities keyed by (start, end), remembering first-insertion order
#[derive(Default)]
struct SpanMap {
    entries: Vec<EntitySpan>,
    index: HashMap<(usize, usize), usize>,
}

impl SpanMap {
    fn contains(&self, span: (usize, usize)) -> bool {
        self.index.contains_key(&span)
    }

    fn get(&self, span: (usize, usize)) -> Option<&EntitySpan> {
        self.index.get(&span).map(|&i| &self.entries[i])
    }

    /// Insert, replacing the value (but not the position) of an existing span
    fn upsert(&mut self, entity: EntitySpan) {
        match self.index.get(&entity.span()) {
            Some(&i) => self.entries[i] = entity,
            None => self.insert_new(entity),
        }
    }

    fn insert_new(&mut self, entity: EntitySpan) {
        self.index.insert(entity.span(), self.entries.len());
        self.entries.push(entity);
    }

    fn into_sorted(self) -> Vec<EntitySpan> {
        let mut entries = self.entries;
        entries.sort_by_key(|e| e.start);
        entries
    }
}

/// Combine rule and model detections into the final entity list.
///
/// Regex spans always win. Every distinct model text is then searched for
/// again, case-insensitively, across the whole text so that a name found once
/// by the model is masked everywhere it occurs. The result is sorted by start.
pub fn merge_entities(text: &str, regex_entities: Vec<EntitySpan>, model_entities: Vec<EntitySpan>) -> Vec<EntitySpan> {
    let mut merged = SpanMap::default();
    for entity in regex_entities {
        merged.upsert(entity);
    }

    let mut originals = SpanMap::default();
    let mut text_labels: Vec<(String, Label)> = Vec::new();
    for entity in model_entities {
        if !entity.text.is_empty() && !text_labels.iter().any(|(t, _)| *t == entity.text) {
            text_labels.push((entity.text.clone(), entity.label.clone()));
        }
        originals.upsert(entity);
    }

    let index = CharIndex::new(text);
    for (needle, label) in &text_labels {
        let pattern = match RegexBuilder::new(&regex::escape(needle))
            .case_insensitive(true)
            .build()
        {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!("skipping global scan for {:?}: {}", needle, e);
                continue;
            }
        };

        for m in pattern.find_iter(text) {
            let span = (index.to_char(m.start()), index.to_char(m.end()));
            if merged.contains(span) {
                continue;
            }

            let entity = match originals.get(span) {
                Some(original) => original.clone(),
                None => EntitySpan::new(m.as_str(), label.clone(), span.0, span.1, Method::ModelGlobalScan),
            };
            merged.insert_new(entity);
        }
    }

    for entity in originals.entries {
        if !merged.contains(entity.span()) {
            merged.insert_new(entity);
        }
    }

    merged.into_sorted()
}
