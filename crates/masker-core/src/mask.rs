//! Span merging and per-label masking

use crate::{EntitySpan, Label};

const MASK: char = '*';

/// Merged region of the text to be masked
struct MaskRegion {
    start: usize,
    end: usize,
    label: Label,
}

/// Replace every entity span in `text` with its masked form.
///
/// Spans are merged only when they truly overlap; touching spans (such as a
/// name immediately followed by an ID number) stay separate. When a merged
/// region contains a numeric label that label decides the mask style. The
/// output always has the same char length as the input.
pub fn apply_masking(text: &str, entities: &[EntitySpan]) -> String {
    let chars: Vec<char> = text.chars().collect();
    let regions = merge_regions(entities, chars.len());

    let mut out = String::with_capacity(text.len());
    let mut prev = 0;

    for region in regions {
        out.extend(&chars[prev..region.start]);
        out.extend(mask_segment(&region.label, &chars[region.start..region.end]));
        prev = region.end;
    }
    out.extend(&chars[prev..]);

    out
}

fn merge_regions(entities: &[EntitySpan], len: usize) -> Vec<MaskRegion> {
    let mut sorted: Vec<&EntitySpan> = entities.iter().collect();
    sorted.sort_by_key(|e| e.start);

    let mut regions: Vec<MaskRegion> = Vec::new();
    for entity in sorted {
        let start = entity.start.min(len);
        let end = entity.end.min(len);
        if start >= end {
            continue;
        }

        match regions.last_mut() {
            Some(last) if start < last.end => {
                last.end = last.end.max(end);
                if entity.label.is_numeric() {
                    last.label = entity.label.clone();
                }
            }
            _ => regions.push(MaskRegion {
                start,
                end,
                label: entity.label.clone(),
            }),
        }
    }

    regions
}

fn mask_segment(label: &Label, segment: &[char]) -> Vec<char> {
    let mut masked = segment.to_vec();

    match label {
        Label::IdCard => {
            // Hide the last six digits (birth suffix and checksum)
            let digits = positions(segment, |c| c.is_numeric() || c.eq_ignore_ascii_case(&'x'));
            let keep = digits.len().saturating_sub(6);
            for &i in &digits[keep..] {
                masked[i] = MASK;
            }
        }
        Label::Mobile => {
            let digits = positions(segment, char::is_numeric);
            if digits.len() >= 11 {
                let from = if digits.len() == 11 { 3 } else { digits.len() - 8 };
                for &i in &digits[from..from + 4] {
                    masked[i] = MASK;
                }
            }
        }
        Label::Landline => {
            let digits = positions(segment, char::is_numeric);
            let mid = digits.len() / 2;
            let from = mid.saturating_sub(2);
            let to = (mid + 2).min(digits.len());
            for &i in &digits[from..to] {
                masked[i] = MASK;
            }
        }
        Label::Name => {
            if let Some(first) = masked.first_mut() {
                *first = MASK;
            }
        }
        Label::BankCard | Label::CreditCode => {
            // Keep the last four alphanumerics
            let chars = positions(segment, |c| c.is_numeric() || c.is_alphabetic());
            let hide = if chars.len() > 4 { chars.len() - 4 } else { chars.len() };
            for &i in &chars[..hide] {
                masked[i] = MASK;
            }
        }
        Label::Passport => {
            if masked.len() > 2 {
                let last = masked.len() - 1;
                for c in &mut masked[1..last] {
                    *c = MASK;
                }
            }
        }
        Label::HkMacauPermit => {
            if masked.len() >= 9 {
                for c in &mut masked[2..6] {
                    *c = MASK;
                }
            }
        }
        Label::LicensePlate => {
            if masked.len() >= 7 {
                let last = masked.len() - 1;
                for c in &mut masked[2..last] {
                    if c.is_alphanumeric() {
                        *c = MASK;
                    }
                }
            }
        }
        _ => masked.fill(MASK),
    }

    masked
}

fn positions(segment: &[char], pred: impl Fn(char) -> bool) -> Vec<usize> {
    segment
        .iter()
        .enumerate()
        .filter(|&(_, &c)| pred(c))
        .map(|(i, _)| i)
        .collect()
}
