//! Entity label taxonomy

use serde::{Deserialize, Serialize};
use std::fmt;

/// Labels matched by the regex rule engine, in priority order
pub const MANDATORY_NUMERIC_SCHEMA: [&str; 8] = [
    "身份证号",
    "手机号码",
    "固定电话",
    "银行卡号",
    "统一社会信用代码",
    "护照号码",
    "港澳通行证",
    "车牌号码",
];

/// Labels resolved by the semantic extractor
pub const OPTIONAL_SEMANTIC_SCHEMA: [&str; 5] = ["姓名", "地址", "企业名称", "机构名称", "电子邮箱"];

/// Kind of sensitive entity.
///
/// Serializes as the plain label name. Unknown names become `Custom` and are
/// handed to the semantic extractor as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Label {
    IdCard,
    Mobile,
    Landline,
    BankCard,
    CreditCode,
    Passport,
    HkMacauPermit,
    LicensePlate,
    Name,
    Address,
    Company,
    Institution,
    Email,
    Custom(String),
}

impl Label {
    pub fn from_name(name: &str) -> Self {
        match name {
            "身份证号" => Label::IdCard,
            "手机号码" => Label::Mobile,
            "固定电话" => Label::Landline,
            "银行卡号" => Label::BankCard,
            "统一社会信用代码" => Label::CreditCode,
            "护照号码" => Label::Passport,
            "港澳通行证" => Label::HkMacauPermit,
            "车牌号码" => Label::LicensePlate,
            "姓名" => Label::Name,
            "地址" => Label::Address,
            "企业名称" => Label::Company,
            "机构名称" => Label::Institution,
            "电子邮箱" => Label::Email,
            other => Label::Custom(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Label::IdCard => "身份证号",
            Label::Mobile => "手机号码",
            Label::Landline => "固定电话",
            Label::BankCard => "银行卡号",
            Label::CreditCode => "统一社会信用代码",
            Label::Passport => "护照号码",
            Label::HkMacauPermit => "港澳通行证",
            Label::LicensePlate => "车牌号码",
            Label::Name => "姓名",
            Label::Address => "地址",
            Label::Company => "企业名称",
            Label::Institution => "机构名称",
            Label::Email => "电子邮箱",
            Label::Custom(name) => name,
        }
    }

    /// Whether this label is detected by regex rules rather than the model
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Label::IdCard
                | Label::Mobile
                | Label::Landline
                | Label::BankCard
                | Label::CreditCode
                | Label::Passport
                | Label::HkMacauPermit
                | Label::LicensePlate
        )
    }

    /// Split a mixed label list into (numeric, semantic), keeping order
    pub fn partition(labels: &[Label]) -> (Vec<Label>, Vec<Label>) {
        labels.iter().cloned().partition(Label::is_numeric)
    }

    /// Merge user-typed labels into a selection.
    ///
    /// `custom` is split on ASCII/full-width commas, the ideographic comma and
    /// whitespace; duplicates are dropped.
    pub fn merge_custom(selected: &[Label], custom: &str) -> Vec<Label> {
        let mut labels = selected.to_vec();
        for name in custom
            .split(|c: char| c == ',' || c == '，' || c == '、' || c.is_whitespace())
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            let label = Label::from_name(name);
            if !labels.contains(&label) {
                labels.push(label);
            }
        }
        labels
    }
}

impl From<String> for Label {
    fn from(name: String) -> Self {
        Label::from_name(&name)
    }
}

impl From<&str> for Label {
    fn from(name: &str) -> Self {
        Label::from_name(name)
    }
}

impl From<Label> for String {
    fn from(label: Label) -> Self {
        match label {
            Label::Custom(name) => name,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_round_trip() {
        for name in MANDATORY_NUMERIC_SCHEMA.iter().chain(OPTIONAL_SEMANTIC_SCHEMA.iter()) {
            let label = Label::from_name(name);
            assert!(!matches!(label, Label::Custom(_)), "{name} should be known");
            assert_eq!(label.as_str(), *name);
        }
    }

    #[test]
    fn test_numeric_split() {
        let labels: Vec<Label> = ["姓名", "身份证号", "车牌号码", "职位"]
            .into_iter()
            .map(Label::from)
            .collect();

        let (numeric, semantic) = Label::partition(&labels);
        assert_eq!(numeric, vec![Label::IdCard, Label::LicensePlate]);
        assert_eq!(semantic, vec![Label::Name, Label::Custom("职位".to_string())]);
    }

    #[test]
    fn test_serde_as_plain_string() {
        let json = serde_json::to_string(&vec![Label::Mobile, Label::Custom("职位".into())]).unwrap();
        assert_eq!(json, r#"["手机号码","职位"]"#);

        let parsed: Vec<Label> = serde_json::from_str(r#"["地址","项目代号"]"#).unwrap();
        assert_eq!(parsed[0], Label::Address);
        assert_eq!(parsed[1], Label::Custom("项目代号".to_string()));
    }

    #[test]
    fn test_merge_custom() {
        let merged = Label::merge_custom(&[Label::Name], "职位，姓名、 项目代号,");
        assert_eq!(
            merged,
            vec![
                Label::Name,
                Label::Custom("职位".into()),
                Label::Custom("项目代号".into())
            ]
        );
    }
}
