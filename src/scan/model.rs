//! # 扫描结果模型
//!
//! ## 设计思路
//!
//! 服务端 `/scan` 与 `/scan_barcode` 返回同一形状的 JSON，所有字段均可缺省。
//! 缺省或为 `null` 的字段表示“不渲染该区块”，而不是错误。
//!
//! 注意两处与直觉不同的负载：
//! - `health_found` 是 `[ingredient, reason]` 二元组数组，`reason` 可能是字符串，
//!   也可能是数值扣分权重。
//! - `severity` 通常是 `high / medium / low`，未知取值原样保留。

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// 一次扫描的结构化结果。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detections: Option<Vec<Detection>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_allergies: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relevant: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safe_alternatives: Option<BTreeMap<String, Vec<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_found: Option<Vec<RiskyIngredient>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predictive_allergens: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingredients: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScanResult {
    /// 服务端报告的错误信息；空字符串视为未报告。
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref().filter(|e| !e.is_empty())
    }

    /// 原始输出面板内容：OCR 文本优先，其次配料文本。
    pub fn raw_output(&self) -> Option<&str> {
        self.raw_text
            .as_deref()
            .filter(|t| !t.is_empty())
            .or_else(|| self.ingredients.as_deref().filter(|t| !t.is_empty()))
    }
}

/// 一条过敏原检出记录。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub allergen: String,
    pub severity: Severity,
    /// 命中的关键词，仅用于诊断。
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Severity {
    High,
    Medium,
    Low,
    Other(String),
}

impl From<String> for Severity {
    fn from(value: String) -> Self {
        match value.as_str() {
            "high" => Self::High,
            "medium" => Self::Medium,
            "low" => Self::Low,
            _ => Self::Other(value),
        }
    }
}

impl From<Severity> for String {
    fn from(value: Severity) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::High => f.write_str("high"),
            Self::Medium => f.write_str("medium"),
            Self::Low => f.write_str("low"),
            Self::Other(raw) => f.write_str(raw),
        }
    }
}

/// 健康评分中的风险配料：`[ingredient, reason]`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskyIngredient(pub String, pub RiskReason);

impl RiskyIngredient {
    pub fn ingredient(&self) -> &str {
        &self.0
    }

    pub fn reason(&self) -> &RiskReason {
        &self.1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RiskReason {
    Text(String),
    Weight(f64),
}

impl fmt::Display for RiskReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Weight(weight) => write!(f, "-{}", weight),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_image_scan_payload() {
        let body = r#"{
            "raw_text": "Milk, Sugar, may contain peanuts",
            "detections": [
                {"allergen": "milk", "matched": "milk", "severity": "high"},
                {"allergen": "peanut", "matched": "may contain/produced in facility", "severity": "medium"}
            ],
            "user_allergies": ["peanut"],
            "relevant": ["peanut"],
            "message": "High Risk: peanut",
            "safe_alternatives": {"milk": ["Soy milk", "Oat milk"], "peanut": []},
            "health_score": 80,
            "health_found": [["sugar", 20]],
            "predictive_allergens": []
        }"#;

        let result: ScanResult = serde_json::from_str(body).expect("payload should parse");

        let detections = result.detections.as_ref().expect("detections present");
        assert_eq!(detections.len(), 2);
        assert_eq!(detections[0].severity, Severity::High);
        assert_eq!(detections[1].severity, Severity::Medium);
        assert_eq!(result.health_score, Some(80.0));

        let found = result.health_found.as_ref().expect("health_found present");
        assert_eq!(found[0].ingredient(), "sugar");
        assert_eq!(found[0].reason(), &RiskReason::Weight(20.0));
        assert_eq!(result.raw_output(), Some("Milk, Sugar, may contain peanuts"));
    }

    #[test]
    fn parses_barcode_payload_with_text_reasons() {
        let body = r#"{
            "product_name": "Chocolate Bar",
            "ingredients": "Milk, Sugar, Cocoa, Peanut oil",
            "health_score": 42,
            "health_found": [["sugar", "high glycemic"]]
        }"#;

        let result: ScanResult = serde_json::from_str(body).expect("payload should parse");

        assert_eq!(result.product_name.as_deref(), Some("Chocolate Bar"));
        assert_eq!(
            result.health_found.as_ref().map(|f| f[0].reason().to_string()),
            Some("high glycemic".to_string())
        );
        assert_eq!(result.raw_output(), Some("Milk, Sugar, Cocoa, Peanut oil"));
    }

    #[test]
    fn null_fields_are_treated_as_absent() {
        let body = r#"{ "detections": null, "health_score": null, "error": "" }"#;
        let result: ScanResult = serde_json::from_str(body).expect("payload should parse");

        assert!(result.detections.is_none());
        assert!(result.health_score.is_none());
        assert!(result.error_message().is_none());
    }

    #[test]
    fn unknown_severity_is_preserved() {
        let detection: Detection =
            serde_json::from_str(r#"{"allergen": "soy", "severity": "trace"}"#)
                .expect("detection should parse");

        assert_eq!(detection.severity, Severity::Other("trace".to_string()));
        assert_eq!(detection.severity.to_string(), "trace");
    }

    #[test]
    fn empty_raw_text_falls_through_to_ingredients() {
        let result = ScanResult {
            raw_text: Some(String::new()),
            ingredients: Some("Water, Oats".to_string()),
            ..ScanResult::default()
        };

        assert_eq!(result.raw_output(), Some("Water, Oats"));
    }
}
