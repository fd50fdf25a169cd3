//! # 结果渲染
//!
//! ## 设计思路
//!
//! 渲染是纯函数：`ScanResult → RenderedScan`。先生成结构化的 `Section` 列表，
//! 再分别输出 HTML（页面结果区）和纯文本（终端）。
//!
//! 区块顺序固定：提示信息 → 检出过敏原 → 用户过敏原 → 安全替代品 →
//! 健康评分（含风险配料脚注）→ 潜在隐藏过敏原。
//! 字段缺省或为空时对应区块整体省略。
//!
//! 服务端 `message` 自带 `<br>` 等标记，HTML 输出中原样保留；
//! 其余来自响应的文本一律转义。

use once_cell::sync::Lazy;
use regex::Regex;

use super::ScanResult;

pub const RAW_OUTPUT_PREFIX: &str = "Scan Output:\n\n";
pub const RAW_OUTPUT_NONE: &str = "(none)";

static LINE_BREAK_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<br\s*/?>").expect("valid line break pattern"));
static ANY_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid tag pattern"));

/// 结果区的一个区块。
#[derive(Debug, Clone, PartialEq)]
pub enum Section {
    Message(String),
    /// 每项已格式化为 `allergen (severity)`。
    Detections(Vec<String>),
    UserAllergies(Vec<String>),
    /// `(allergen, alternatives)`，按过敏原名排序。
    SafeAlternatives(Vec<(String, Vec<String>)>),
    HealthScore {
        score: String,
        risky_ingredients: Vec<String>,
    },
    PredictiveAllergens(Vec<String>),
}

/// 渲染产物：结果区区块 + 原始输出面板文本。
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedScan {
    pub sections: Vec<Section>,
    pub raw_output: String,
}

pub fn render_results(result: &ScanResult) -> RenderedScan {
    let mut sections = Vec::new();

    if let Some(message) = result.message.as_deref().filter(|m| !m.is_empty()) {
        sections.push(Section::Message(message.to_string()));
    }

    if let Some(detections) = result.detections.as_ref().filter(|d| !d.is_empty()) {
        sections.push(Section::Detections(
            detections
                .iter()
                .map(|d| format!("{} ({})", d.allergen, d.severity))
                .collect(),
        ));
    }

    if let Some(allergies) = non_empty(&result.user_allergies) {
        sections.push(Section::UserAllergies(allergies.to_vec()));
    }

    if let Some(alternatives) = result.safe_alternatives.as_ref().filter(|a| !a.is_empty()) {
        sections.push(Section::SafeAlternatives(
            alternatives
                .iter()
                .map(|(allergen, products)| (allergen.clone(), products.clone()))
                .collect(),
        ));
    }

    if let Some(score) = result.health_score {
        let risky_ingredients = result
            .health_found
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|found| found.ingredient().to_string())
            .collect();
        sections.push(Section::HealthScore {
            score: score.to_string(),
            risky_ingredients,
        });
    }

    if let Some(predicted) = non_empty(&result.predictive_allergens) {
        sections.push(Section::PredictiveAllergens(predicted.to_vec()));
    }

    let raw_output = format!(
        "{}{}",
        RAW_OUTPUT_PREFIX,
        result.raw_output().unwrap_or(RAW_OUTPUT_NONE)
    );

    RenderedScan {
        sections,
        raw_output,
    }
}

fn non_empty(list: &Option<Vec<String>>) -> Option<&[String]> {
    list.as_deref().filter(|l| !l.is_empty())
}

impl RenderedScan {
    pub fn has_detections(&self) -> bool {
        self.sections
            .iter()
            .any(|s| matches!(s, Section::Detections(_)))
    }

    /// 页面结果区 HTML 片段。
    pub fn to_html(&self) -> String {
        let mut html = String::new();

        for section in &self.sections {
            match section {
                Section::Message(message) => {
                    html.push_str(&format!("<strong>{}</strong><br/><br/>", message));
                }
                Section::Detections(items) => {
                    html.push_str(&format!(
                        "<div><strong>Detected Allergens:</strong> {}</div>",
                        escape_join(items)
                    ));
                }
                Section::UserAllergies(items) => {
                    html.push_str(&format!(
                        "<div><strong>Your Allergies:</strong> {}</div>",
                        escape_join(items)
                    ));
                }
                Section::SafeAlternatives(entries) => {
                    html.push_str(
                        "<div style=\"margin-top:10px;\"><strong>Safe Alternatives:</strong><dl>",
                    );
                    for (allergen, products) in entries {
                        html.push_str(&format!(
                            "<dt><b>{}</b></dt><dd>{}</dd>",
                            escape_html(allergen),
                            escape_join(products)
                        ));
                    }
                    html.push_str("</dl></div>");
                }
                Section::HealthScore {
                    score,
                    risky_ingredients,
                } => {
                    html.push_str(&format!(
                        "<div style=\"margin-top:10px;\"><strong>Health Score: {}/100</strong></div>",
                        escape_html(score)
                    ));
                    if !risky_ingredients.is_empty() {
                        html.push_str(&format!(
                            "<div><small>Risky ingredients: {}</small></div>",
                            escape_join(risky_ingredients)
                        ));
                    }
                }
                Section::PredictiveAllergens(items) => {
                    html.push_str(&format!(
                        "<div style=\"margin-top:10px;\"><strong>Possible Hidden Allergens:</strong> {}</div>",
                        escape_join(items)
                    ));
                }
            }
        }

        html
    }

    /// 终端输出用纯文本。
    pub fn to_plain_text(&self) -> String {
        let mut lines: Vec<String> = Vec::new();

        for section in &self.sections {
            match section {
                Section::Message(message) => {
                    let text = LINE_BREAK_TAG.replace_all(message, "\n");
                    lines.push(ANY_TAG.replace_all(&text, "").into_owned());
                    lines.push(String::new());
                }
                Section::Detections(items) => {
                    lines.push(format!("Detected Allergens: {}", items.join(", ")));
                }
                Section::UserAllergies(items) => {
                    lines.push(format!("Your Allergies: {}", items.join(", ")));
                }
                Section::SafeAlternatives(entries) => {
                    lines.push("Safe Alternatives:".to_string());
                    for (allergen, products) in entries {
                        lines.push(format!("  - {}: {}", allergen, products.join(", ")));
                    }
                }
                Section::HealthScore {
                    score,
                    risky_ingredients,
                } => {
                    lines.push(format!("Health Score: {}/100", score));
                    if !risky_ingredients.is_empty() {
                        lines.push(format!("  Risky ingredients: {}", risky_ingredients.join(", ")));
                    }
                }
                Section::PredictiveAllergens(items) => {
                    lines.push(format!("Possible Hidden Allergens: {}", items.join(", ")));
                }
            }
        }

        lines.join("\n")
    }
}

fn escape_join(items: &[String]) -> String {
    items
        .iter()
        .map(|item| escape_html(item))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::{Detection, RiskReason, RiskyIngredient, Severity};
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    fn parse(json: &str) -> ScanResult {
        serde_json::from_str(json).expect("fixture json")
    }

    #[test]
    fn health_score_and_risky_ingredients_are_rendered() {
        let rendered = render_results(&parse(
            r#"{ "health_score": 42, "health_found": [["sugar", "high glycemic"]] }"#,
        ));

        let html = rendered.to_html();
        assert!(html.contains("Health Score: 42/100"));
        assert!(html.contains("Risky ingredients: sugar"));

        let text = rendered.to_plain_text();
        assert!(text.contains("Health Score: 42/100"));
        assert!(text.contains("Risky ingredients: sugar"));
    }

    #[test]
    fn health_score_without_findings_has_no_footnote() {
        let rendered = render_results(&parse(r#"{ "health_score": 100, "health_found": [] }"#));

        assert!(rendered.to_html().contains("Health Score: 100/100"));
        assert!(!rendered.to_html().contains("Risky ingredients"));
    }

    #[test]
    fn sections_follow_fixed_order() {
        let rendered = render_results(&parse(
            r#"{
                "predictive_allergens": ["egg"],
                "health_score": 55.5,
                "safe_alternatives": {"peanut": ["Almond butter", "Sunflower seed butter"]},
                "user_allergies": ["peanut"],
                "detections": [{"allergen": "peanut", "severity": "high"}],
                "message": "High Risk: peanut"
            }"#,
        ));

        let html = rendered.to_html();
        let positions: Vec<usize> = [
            "High Risk: peanut",
            "Detected Allergens:",
            "Your Allergies:",
            "Safe Alternatives:",
            "Health Score: 55.5/100",
            "Possible Hidden Allergens:",
        ]
        .iter()
        .map(|needle| html.find(needle).unwrap_or_else(|| panic!("missing {}", needle)))
        .collect();

        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(html.contains("peanut (high)"));
        assert!(html.contains("<dt><b>peanut</b></dt><dd>Almond butter, Sunflower seed butter</dd>"));
    }

    #[test]
    fn empty_sections_are_omitted() {
        let rendered = render_results(&parse(
            r#"{ "detections": [], "user_allergies": [], "safe_alternatives": {}, "predictive_allergens": [] }"#,
        ));

        assert!(rendered.sections.is_empty());
        assert_eq!(rendered.to_html(), "");
        assert_eq!(rendered.raw_output, "Scan Output:\n\n(none)");
    }

    #[test]
    fn raw_output_prefers_raw_text_then_ingredients() {
        let ocr = render_results(&parse(r#"{ "raw_text": "WHEAT FLOUR", "ingredients": "x" }"#));
        assert_eq!(ocr.raw_output, "Scan Output:\n\nWHEAT FLOUR");

        let barcode = render_results(&parse(r#"{ "ingredients": "Milk, Sugar" }"#));
        assert_eq!(barcode.raw_output, "Scan Output:\n\nMilk, Sugar");
    }

    #[test]
    fn response_text_is_escaped_but_message_markup_is_kept() {
        let rendered = render_results(&parse(
            r#"{ "message": "High Risk: milk<br>Low Risk: soy", "user_allergies": ["<script>"] }"#,
        ));

        let html = rendered.to_html();
        assert!(html.contains("<strong>High Risk: milk<br>Low Risk: soy</strong>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));

        let text = rendered.to_plain_text();
        assert!(text.starts_with("High Risk: milk\nLow Risk: soy"));
    }

    fn arb_result() -> impl Strategy<Value = ScanResult> {
        let word = "[a-z<>&]{0,8}";
        (
            proptest::option::of(word),
            proptest::option::of(proptest::collection::vec((word, "(high|medium|low|trace)"), 0..4)),
            proptest::option::of(proptest::collection::vec(word, 0..4)),
            proptest::option::of(proptest::collection::btree_map(word, proptest::collection::vec(word, 0..3), 0..3)),
            proptest::option::of(0u8..=100),
            proptest::option::of(proptest::collection::vec((word, word), 0..3)),
            proptest::option::of(proptest::collection::vec(word, 0..3)),
            proptest::option::of(word),
        )
            .prop_map(
                |(message, detections, allergies, alternatives, score, found, predicted, raw)| ScanResult {
                    message,
                    detections: detections.map(|items| {
                        items
                            .into_iter()
                            .map(|(allergen, severity)| Detection {
                                allergen,
                                severity: Severity::from(severity),
                                matched: None,
                            })
                            .collect()
                    }),
                    user_allergies: allergies,
                    safe_alternatives: alternatives.map(|m| m.into_iter().collect::<BTreeMap<_, _>>()),
                    health_score: score.map(f64::from),
                    health_found: found.map(|items| {
                        items
                            .into_iter()
                            .map(|(ingredient, reason)| RiskyIngredient(ingredient, RiskReason::Text(reason)))
                            .collect()
                    }),
                    predictive_allergens: predicted,
                    raw_text: raw,
                    ..ScanResult::default()
                },
            )
    }

    proptest! {
        #[test]
        fn rendering_is_idempotent(result in arb_result()) {
            let first = render_results(&result);
            let second = render_results(&result);
            prop_assert_eq!(first.to_html(), second.to_html());
            prop_assert_eq!(first.to_plain_text(), second.to_plain_text());
            prop_assert_eq!(first, second);
        }

        #[test]
        fn empty_detections_never_render_detected_section(mut result in arb_result(), absent in any::<bool>()) {
            result.detections = if absent { None } else { Some(Vec::new()) };
            let rendered = render_results(&result);
            prop_assert!(!rendered.has_detections());
            prop_assert!(!rendered.to_html().contains("Detected Allergens"));
            prop_assert!(!rendered.to_plain_text().contains("Detected Allergens"));
        }
    }
}
