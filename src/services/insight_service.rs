//! Chart data derived from a stored result payload.
//!
//! Payloads arrive in two shapes: an analysis written by the external
//! processor, or the raw answer set that was submitted. Anything else renders
//! as empty charts.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::utils::json::unwrap_payload;

/// Competency sections of an analysis payload, in radar order.
pub const COMPETENCY_SECTIONS: [(&str, &str); 4] = [
    ("leadership", "Leadership"),
    ("communication", "Communication"),
    ("teamwork", "Teamwork"),
    ("adaptability", "Adaptability"),
];

/// Behavioral score scale read from the analysis `scores` map.
pub const SCORE_SCALE: [(&str, &str); 4] = [
    ("dominance", "D"),
    ("influence", "I"),
    ("steadiness", "S"),
    ("conscientiousness", "C"),
];

pub const DEFAULT_CATEGORY: &str = "General";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadShape {
    Analysis,
    Answers,
    Empty,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub name: String,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct RadarChart {
    pub labels: Vec<String>,
    pub series: Vec<ChartSeries>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarPoint {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryAverage {
    pub category: String,
    pub average: f64,
    pub answers: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insights {
    pub shape: PayloadShape,
    pub radar: RadarChart,
    pub bars: Vec<BarPoint>,
    pub category_averages: Vec<CategoryAverage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub highlights: Vec<String>,
}

impl Insights {
    fn empty() -> Self {
        Self {
            shape: PayloadShape::Empty,
            radar: RadarChart::default(),
            bars: Vec::new(),
            category_averages: Vec::new(),
            summary: None,
            highlights: Vec::new(),
        }
    }

    /// Competency with the highest radar value, for roster exports.
    pub fn top_competency(&self) -> Option<&str> {
        let series = self.radar.series.first()?;
        series
            .values
            .iter()
            .zip(&self.radar.labels)
            .filter(|(v, _)| **v > 0.0)
            .max_by(|a, b| a.0.partial_cmp(b.0).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(_, label)| label.as_str())
    }
}

/// Best-effort derivation; never fails.
pub fn derive(raw: &JsonValue) -> Insights {
    let payload = unwrap_payload(raw);
    if is_analysis(&payload) {
        return from_analysis(&payload);
    }
    match answer_entries(&payload) {
        Some(entries) => from_answers(entries),
        None => Insights::empty(),
    }
}

fn is_analysis(payload: &JsonValue) -> bool {
    let Some(obj) = payload.as_object() else {
        return false;
    };
    COMPETENCY_SECTIONS.iter().any(|(key, _)| obj.contains_key(*key))
        || obj.get("scores").map(|s| s.is_object()).unwrap_or(false)
}

fn number(value: &JsonValue) -> Option<f64> {
    match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn section_score(section: &JsonValue) -> f64 {
    number(section)
        .or_else(|| section.get("score").and_then(number))
        .unwrap_or(0.0)
}

fn from_analysis(payload: &JsonValue) -> Insights {
    let labels = COMPETENCY_SECTIONS
        .iter()
        .map(|(_, label)| label.to_string())
        .collect();
    let values = COMPETENCY_SECTIONS
        .iter()
        .map(|(key, _)| payload.get(*key).map(section_score).unwrap_or(0.0))
        .collect();

    let scores = payload.get("scores");
    let bars = SCORE_SCALE
        .iter()
        .map(|(key, label)| BarPoint {
            label: label.to_string(),
            value: scores
                .and_then(|s| s.get(*key).or_else(|| s.get(*label)))
                .and_then(number)
                .unwrap_or(0.0),
        })
        .collect();

    let mut highlights: Vec<String> = payload
        .get("insights")
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|i| i.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();
    for (key, label) in COMPETENCY_SECTIONS {
        if let Some(text) = payload
            .get(key)
            .and_then(|s| s.get("insight").or_else(|| s.get("summary")))
            .and_then(|t| t.as_str())
        {
            highlights.push(format!("{}: {}", label, text));
        }
    }

    Insights {
        shape: PayloadShape::Analysis,
        radar: RadarChart {
            labels,
            series: vec![ChartSeries {
                name: "Competencies".to_string(),
                values,
            }],
        },
        bars,
        category_averages: Vec::new(),
        summary: payload
            .get("summary")
            .and_then(|s| s.as_str())
            .map(str::to_string),
        highlights,
    }
}

fn answer_entries(payload: &JsonValue) -> Option<&Vec<JsonValue>> {
    match payload {
        JsonValue::Array(items) => Some(items),
        JsonValue::Object(obj) => obj.get("body").and_then(|b| b.as_array()),
        _ => None,
    }
}

fn from_answers(entries: &[JsonValue]) -> Insights {
    // Insertion order is kept so charts list categories as they were asked.
    let mut categories: Vec<(String, f64, usize)> = Vec::new();
    let mut tallies: HashMap<String, usize> = HashMap::new();

    for entry in entries {
        let answer = entry.get("answer").or_else(|| entry.get("value"));
        let Some(answer) = answer else { continue };
        let is_scale = entry.get("type").and_then(|t| t.as_str()) == Some("scale");

        match answer {
            JsonValue::Number(_) if is_scale || entry.get("type").is_none() => {
                let Some(value) = number(answer) else { continue };
                let category = entry
                    .get("category")
                    .and_then(|c| c.as_str())
                    .filter(|c| !c.trim().is_empty())
                    .unwrap_or(DEFAULT_CATEGORY)
                    .to_string();
                match categories.iter_mut().find(|(name, _, _)| *name == category) {
                    Some((_, sum, count)) => {
                        *sum += value;
                        *count += 1;
                    }
                    None => categories.push((category, value, 1)),
                }
            }
            JsonValue::String(text) if !text.trim().is_empty() => {
                *tallies.entry(text.clone()).or_default() += 1;
            }
            JsonValue::Object(obj) => {
                if let Some(most) = obj.get("most").and_then(|m| m.as_str()) {
                    *tallies.entry(most.to_string()).or_default() += 1;
                }
            }
            _ => {}
        }
    }

    let category_averages: Vec<CategoryAverage> = categories
        .into_iter()
        .map(|(category, sum, count)| CategoryAverage {
            category,
            average: round2(sum / count as f64),
            answers: count,
        })
        .collect();

    let radar = if category_averages.is_empty() {
        RadarChart::default()
    } else {
        RadarChart {
            labels: category_averages.iter().map(|c| c.category.clone()).collect(),
            series: vec![ChartSeries {
                name: "Average".to_string(),
                values: category_averages.iter().map(|c| c.average).collect(),
            }],
        }
    };

    let mut bars: Vec<BarPoint> = tallies
        .into_iter()
        .map(|(label, count)| BarPoint {
            label,
            value: count as f64,
        })
        .collect();
    bars.sort_by(|a, b| {
        b.value
            .partial_cmp(&a.value)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.label.cmp(&b.label))
    });

    Insights {
        shape: PayloadShape::Answers,
        radar,
        bars,
        category_averages,
        summary: None,
        highlights: Vec::new(),
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
