//! Mapping masked text back onto document text runs

use masker_core::EntitySpan;
use serde::Serialize;

use crate::docx::TextRun;

/// Replace chars `[start, end)` of the document text with `new_text`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Replacement {
    pub start: usize,
    pub end: usize,
    pub new_text: String,
}

impl Replacement {
    fn is_same_length(&self) -> bool {
        self.new_text.chars().count() == self.end - self.start
    }

    /// The part of `new_text` that belongs to document chars `[from, to)`.
    ///
    /// A replacement that changes length cannot be split, so the whole text
    /// goes where the replacement starts and later pieces are empty.
    fn piece(&self, from: usize, to: usize) -> String {
        if self.is_same_length() {
            self.new_text.chars().skip(from - self.start).take(to - from).collect()
        } else if from == self.start {
            self.new_text.clone()
        } else {
            String::new()
        }
    }
}

/// Work out what to rewrite, given the service's answer.
///
/// Masking normally keeps the char length, in which case every maximal run
/// of differing chars becomes a replacement. Otherwise each entity's span is
/// replaced by the masked text at the same offsets.
pub fn generate_replacements(original: &str, masked: &str, entities: &[EntitySpan]) -> Vec<Replacement> {
    let original: Vec<char> = original.chars().collect();
    let masked: Vec<char> = masked.chars().collect();
    let mut replacements = Vec::new();

    if original.len() == masked.len() {
        let mut i = 0;
        while i < original.len() {
            if original[i] == masked[i] {
                i += 1;
                continue;
            }
            let start = i;
            while i < original.len() && original[i] != masked[i] {
                i += 1;
            }
            replacements.push(Replacement {
                start,
                end: i,
                new_text: masked[start..i].iter().collect(),
            });
        }
    } else {
        tracing::warn!(
            "masked text length differs ({} vs {}), replacing by entity",
            masked.len(),
            original.len()
        );

        let mut sorted: Vec<&EntitySpan> = entities.iter().collect();
        sorted.sort_by_key(|e| e.start);

        for entity in sorted {
            let end = entity.end.min(original.len());
            if entity.start >= end || entity.start >= masked.len() {
                continue;
            }
            let masked_end = end.min(masked.len());
            let new_text: String = masked[entity.start..masked_end].iter().collect();
            let old_text: String = original[entity.start..end].iter().collect();

            if new_text != old_text {
                replacements.push(Replacement {
                    start: entity.start,
                    end,
                    new_text,
                });
            }
        }
    }

    merge_overlapping(replacements)
}

fn merge_overlapping(mut replacements: Vec<Replacement>) -> Vec<Replacement> {
    replacements.sort_by_key(|r| r.start);

    let mut merged: Vec<Replacement> = Vec::with_capacity(replacements.len());
    for rep in replacements {
        match merged.last_mut() {
            Some(last) if rep.start < last.end => {
                tracing::warn!("overlapping replacements at [{}, {})", rep.start, rep.end);
                last.end = last.end.max(rep.end);
                last.new_text = rep.new_text;
            }
            _ => merged.push(rep),
        }
    }

    merged
}

/// New text for each run, `None` where the run is unchanged
pub fn apply_to_runs(runs: &[TextRun], replacements: &[Replacement]) -> Vec<Option<String>> {
    runs.iter()
        .map(|run| {
            let chars: Vec<char> = run.text.chars().collect();
            let mut out = String::with_capacity(run.text.len());
            let mut cursor = 0;

            for rep in replacements.iter().filter(|r| r.start < run.end && r.end > run.start) {
                let from = rep.start.max(run.start);
                let to = rep.end.min(run.end);

                out.extend(&chars[cursor..from - run.start]);
                out.push_str(&rep.piece(from, to));
                cursor = to - run.start;
            }
            out.extend(&chars[cursor..]);

            if out == run.text {
                None
            } else {
                tracing::debug!("run [{}, {}): {:?} -> {:?}", run.start, run.end, run.text, out);
                Some(out)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::extract_runs;
    use masker_core::{Label, Method};

    fn runs_of(texts: &[&str]) -> Vec<TextRun> {
        let xml: String = texts.iter().map(|t| format!("<w:t>{}</w:t>", t)).collect();
        extract_runs(&xml)
    }

    #[test]
    fn test_char_diff() {
        let reps = generate_replacements("张三的电话13812345678", "*三的电话138****5678", &[]);

        assert_eq!(
            reps,
            vec![
                Replacement { start: 0, end: 1, new_text: "*".into() },
                Replacement { start: 8, end: 12, new_text: "****".into() },
            ]
        );
    }

    #[test]
    fn test_entity_fallback_when_lengths_differ() {
        let entities = vec![EntitySpan::new("张三", Label::Name, 0, 2, Method::ModelChunk)];
        let reps = generate_replacements("张三来了", "[姓名]来了", &entities);

        assert_eq!(reps, vec![Replacement { start: 0, end: 2, new_text: "[姓".into() }]);
    }

    #[test]
    fn test_overlaps_merge_last_text_wins() {
        let merged = merge_overlapping(vec![
            Replacement { start: 0, end: 4, new_text: "aaaa".into() },
            Replacement { start: 2, end: 6, new_text: "bbbb".into() },
            Replacement { start: 6, end: 7, new_text: "c".into() },
        ]);

        assert_eq!(merged.len(), 2);
        assert_eq!((merged[0].start, merged[0].end), (0, 6));
        assert_eq!(merged[0].new_text, "bbbb");
    }

    #[test]
    fn test_replacement_split_across_runs() {
        let runs = runs_of(&["张三的电话", "1381234", "5678"]);
        let reps = generate_replacements(
            "张三的电话13812345678",
            "张三的电话138****5678",
            &[],
        );

        let new_texts = apply_to_runs(&runs, &reps);
        assert_eq!(new_texts, vec![None, Some("138****".to_string()), None]);
    }

    #[test]
    fn test_length_changing_replacement_goes_to_first_run() {
        let runs = runs_of(&["张", "三来了"]);
        let reps = vec![Replacement { start: 0, end: 2, new_text: "[姓名]".into() }];

        let new_texts = apply_to_runs(&runs, &reps);
        assert_eq!(new_texts, vec![Some("[姓名]".to_string()), Some("来了".to_string())]);
    }

    #[test]
    fn test_masked_join_matches() {
        let runs = runs_of(&["身份证110105", "194912310021", "结束"]);
        let original = "身份证110105194912310021结束";
        let masked = "身份证110105194912******结束";

        let new_texts = apply_to_runs(&runs, &generate_replacements(original, masked, &[]));
        let joined: String = runs
            .iter()
            .zip(&new_texts)
            .map(|(run, new)| new.clone().unwrap_or_else(|| run.text.clone()))
            .collect();

        assert_eq!(joined, masked);
    }
}
