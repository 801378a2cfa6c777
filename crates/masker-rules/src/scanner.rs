use lazy_static::lazy_static;
use masker_core::{CharIndex, EntitySpan, Label, Method};
use std::ops::Range;

use crate::pattern::{Boundary, BoundedPattern};

/// Province abbreviations that open a mainland licence plate
const PROVINCES: &str = "京津沪渝冀豫云辽黑湘皖鲁新苏浙赣鄂桂甘晋蒙陕吉闽贵粤青藏川宁琼";

/// ASCII whitespace or a dash, allowed after the plate's city letter
const PLATE_SEPARATOR: &str = r"[ \t\n\x0B\x0C\r\-]";

struct Rule {
    label: Label,
    pattern: BoundedPattern,
    /// Skip matches inside higher-priority spans and claim the span afterwards
    guarded: bool,
    validate: Option<fn(&str) -> bool>,
}

impl Rule {
    fn new(label: Label, core: &str, boundary: Boundary, guarded: bool) -> Self {
        Self {
            label,
            pattern: BoundedPattern::new(core, boundary).expect("built-in rule pattern is valid"),
            guarded,
            validate: None,
        }
    }

    fn with_validation(mut self, validate: fn(&str) -> bool) -> Self {
        self.validate = Some(validate);
        self
    }
}

lazy_static! {
    // Order matters - most precise first, widest (bank card) last among guarded rules
    static ref RULES: Vec<Rule> = vec![
        Rule::new(
            Label::IdCard,
            r"[1-9]\d{5}(?:19|20)\d{2}(?:0[1-9]|1[0-2])(?:0[1-9]|[12]\d|3[01])\d{3}[0-9Xx]",
            Boundary::Alphanumeric,
            true,
        ),
        Rule::new(
            Label::CreditCode,
            r"[1-9ANY][1-59]\d{6}[0-9ABCDEFGHJKLMNPQRSTUWXY]{10}",
            Boundary::UpperAlphanumeric,
            true,
        ),
        Rule::new(
            Label::Mobile,
            r"(?:\+86|86)?\s?1[3-9]\d{9}",
            Boundary::Alphanumeric,
            true,
        ),
        Rule::new(
            Label::Landline,
            r"(?:0\d{2,3}-)?\d{7,8}",
            Boundary::Alphanumeric,
            true,
        ),
        Rule::new(
            Label::BankCard,
            r"(?:\d[ -]?){13,19}",
            Boundary::Alphanumeric,
            true,
        )
        .with_validation(|s| (13..=19).contains(&s.chars().filter(|c| c.is_numeric()).count())),
        Rule::new(
            Label::Passport,
            r"[DEGSP]\d{7,8}",
            Boundary::UpperAlphanumeric,
            false,
        ),
        Rule::new(
            Label::HkMacauPermit,
            r"[CWHM]\d{8}",
            Boundary::UpperAlphanumeric,
            false,
        ),
        Rule::new(
            Label::LicensePlate,
            &format!(
                "(?:[{PROVINCES}][A-Z]{PLATE_SEPARATOR}?[A-Z0-9]{{5,6}}|粤Z{PLATE_SEPARATOR}?[A-Z0-9]{{4}}[港澳])"
            ),
            Boundary::UpperAlphanumeric,
            false,
        ),
    ];
}

/// Scans text for the rule-based labels
#[derive(Debug, Default, Clone, Copy)]
pub struct RuleScanner;

impl RuleScanner {
    pub fn new() -> Self {
        Self
    }

    /// Find every requested numeric entity in `text`.
    ///
    /// Labels without a rule are ignored. Results are grouped by rule in
    /// priority order, each group in text order.
    pub fn scan(&self, text: &str, labels: &[Label]) -> Vec<EntitySpan> {
        let index = CharIndex::new(text);
        let mut entities = Vec::new();
        let mut occupied: Vec<Range<usize>> = Vec::new();

        for rule in RULES.iter().filter(|r| labels.contains(&r.label)) {
            let mut found = 0;

            for m in rule.pattern.find_all(text) {
                if rule.validate.is_some_and(|validate| !validate(m.as_str())) {
                    continue;
                }
                if rule.guarded {
                    if occupied.iter().any(|o| o.start <= m.start() && m.end() <= o.end) {
                        continue;
                    }
                    occupied.push(m.range());
                }

                entities.push(EntitySpan::new(
                    m.as_str(),
                    rule.label.clone(),
                    index.to_char(m.start()),
                    index.to_char(m.end()),
                    Method::Regex,
                ));
                found += 1;
            }

            if found > 0 {
                tracing::debug!("rule {} matched {} span(s)", rule.label, found);
            }
        }

        entities
    }
}
