//! Post-processing of generated text.

use crate::models::GeneratedQuestion;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

/// Mentions of each DOK level in a generated analysis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DokStatistics {
    pub dok1: usize,
    pub dok2: usize,
    pub dok3: usize,
    pub dok4: usize,
    pub total: usize,
}

static DOK_PATTERNS: Lazy<[Regex; 4]> = Lazy::new(|| {
    [
        (1, "memorístico"),
        (2, "conceptos"),
        (3, "estratégico"),
        (4, "extendido"),
    ]
    .map(|(level, keyword)| {
        Regex::new(&format!(r"(?i)DOK\s*{level}|nivel\s*{level}|{keyword}"))
            .unwrap_or_else(|e| panic!("invalid DOK pattern for level {}: {}", level, e))
    })
});

impl DokStatistics {
    /// Count how often the text refers to each level, by number or by name.
    pub fn from_text(text: &str) -> Self {
        let [dok1, dok2, dok3, dok4] = DOK_PATTERNS
            .each_ref()
            .map(|pattern| pattern.find_iter(text).count());

        Self {
            dok1,
            dok2,
            dok3,
            dok4,
            total: dok1 + dok2 + dok3 + dok4,
        }
    }
}

const DEFAULT_DOK_LEVEL: u8 = 2;

/// Read a DOK level written as an integer, a float or a numeric string.
fn dok_level(value: Option<&Value>) -> u8 {
    let level = match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64)),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|f| *f >= 0.0)
            .map(|f| f.round() as u64),
        _ => None,
    };
    level
        .and_then(|l| u8::try_from(l).ok())
        .unwrap_or(DEFAULT_DOK_LEVEL)
}

fn question_from_value(value: &Value) -> Option<GeneratedQuestion> {
    let pregunta = value.get("pregunta")?.as_str()?.trim();
    if pregunta.is_empty() {
        return None;
    }
    let level = value.get("nivel_dok").or_else(|| value.get("dok_level"));
    Some(GeneratedQuestion {
        pregunta: pregunta.to_string(),
        nivel_dok: dok_level(level),
    })
}

/// Parse the question array out of a model reply.
///
/// The reply is expected to hold a JSON array somewhere in it, often wrapped
/// in prose or a code fence. Elements are read one by one: any object with a
/// `pregunta` is kept, and a missing or unreadable level becomes DOK 2.
/// Anything that does not yield at least one question comes back as a single
/// DOK 2 question holding the raw text.
pub fn parse_questions(text: &str) -> Vec<GeneratedQuestion> {
    let parsed = match (text.find('['), text.rfind(']')) {
        (Some(start), Some(end)) if start < end => {
            match serde_json::from_str::<Vec<Value>>(&text[start..=end]) {
                Ok(items) => items.iter().filter_map(question_from_value).collect(),
                Err(e) => {
                    tracing::warn!(error = %e, "Could not parse generated questions as JSON");
                    Vec::new()
                }
            }
        }
        _ => Vec::new(),
    };

    if parsed.is_empty() {
        return vec![GeneratedQuestion {
            pregunta: text.to_string(),
            nivel_dok: DEFAULT_DOK_LEVEL,
        }];
    }

    parsed
}
