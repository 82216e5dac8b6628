//! Aspect Extractor — produces the initial facet list for a question.
//! LLM-preferred, heuristic fallback. Grounded on the ADR-F002
//! retry-with-repair pattern used elsewhere in this lineage for
//! LLM-structured calls: one attempt, one repair retry on parse failure,
//! then a deterministic fallback. Never raises; worst case returns a single
//! synthetic aspect covering the whole question.

use serde::Deserialize;
use tracing::{debug, warn};

use deep_research_llm::{LlmClient, LlmRequestOptions};

use crate::model::{Aspect, AspectType};

const MAX_ASPECTS: usize = 10;
const DEFAULT_CORE_IMPORTANCE: f64 = 1.0;
const DEFAULT_OPTIONAL_IMPORTANCE: f64 = 0.6;

const SYSTEM_PROMPT: &str = "You decompose a research question into its distinct facets (aspects). \
Respond with a JSON array only, no surrounding prose. Each element: \
{\"name\": string, \"type\": one of definition|comparison|process|causal|evaluation|application|temporal|other, \
\"importance\": number in [0,1], \"core\": boolean, \"keywords\": array of strings}. \
Produce between 1 and 10 aspects.";

#[derive(Debug, Deserialize)]
struct RawAspect {
    name: String,
    #[serde(rename = "type")]
    aspect_type: Option<String>,
    importance: Option<f64>,
    #[serde(default)]
    core: bool,
    #[serde(default)]
    keywords: Vec<String>,
}

/// Extracts aspects for `question`. Returns `(aspects, used_llm)` where
/// `used_llm` is false whenever the heuristic fallback was the one that
/// actually produced the returned aspects.
pub async fn extract(
    question: &str,
    llm: Option<&dyn LlmClient>,
) -> (Vec<Aspect>, bool) {
    if let Some(client) = llm {
        match extract_via_llm(client, question).await {
            Some(aspects) if !aspects.is_empty() => {
                return (order_aspects(aspects), true);
            }
            _ => {
                warn!("aspect extraction: LLM path produced nothing usable, falling back to heuristics");
            }
        }
    }
    (order_aspects(extract_heuristic(question)), false)
}

async fn extract_via_llm(client: &dyn LlmClient, question: &str) -> Option<Vec<Aspect>> {
    let user_prompt = format!("Question: {question}");
    let options = LlmRequestOptions {
        temperature_hint: Some(0.2),
        max_tokens_hint: Some(800),
    };

    let first = client.generate(SYSTEM_PROMPT, &user_prompt, options.clone()).await;
    let raw_text = match first {
        Ok(text) => text,
        Err(err) => {
            warn!(error = %err, "aspect extraction: LLM call failed");
            return None;
        }
    };
    debug!(preview = %preview(&raw_text), "aspect extraction: LLM response received");

    match parse_aspects(&raw_text) {
        Ok(aspects) => Some(aspects),
        Err(parse_err) => {
            warn!(error = %parse_err, preview = %preview(&raw_text), "aspect extraction: parse failed, attempting repair");
            let repair_prompt = build_repair_prompt(question, &raw_text, &parse_err);
            match client.generate(SYSTEM_PROMPT, &repair_prompt, options).await {
                Ok(repaired_text) => match parse_aspects(&repaired_text) {
                    Ok(aspects) => Some(aspects),
                    Err(repair_err) => {
                        warn!(error = %repair_err, "aspect extraction: repair retry also failed to parse");
                        None
                    }
                },
                Err(err) => {
                    warn!(error = %err, "aspect extraction: repair retry call failed");
                    None
                }
            }
        }
    }
}

fn build_repair_prompt(question: &str, malformed: &str, parse_error: &str) -> String {
    format!(
        "Question: {question}\n\nYour previous response could not be parsed as the required JSON \
         array. Parse error: {parse_error}\n\nPrevious response:\n{malformed}\n\n\
         Reply again with only a valid JSON array matching the required shape."
    )
}

/// Extracts a JSON array from `text`, tolerating a markdown code fence or
/// surrounding prose, then validates and converts each entry. Entries that
/// fail to validate are dropped silently rather than failing the whole call.
fn parse_aspects(text: &str) -> Result<Vec<Aspect>, String> {
    let json_slice = extract_json_array(text).ok_or_else(|| "no JSON array found".to_string())?;
    let raw: Vec<RawAspect> =
        serde_json::from_str(json_slice).map_err(|e| format!("invalid JSON: {e}"))?;

    let mut aspects = Vec::new();
    for r in raw {
        if r.name.trim().is_empty() {
            continue;
        }
        let aspect_type = r
            .aspect_type
            .map(|t| AspectType::parse(&t))
            .unwrap_or(AspectType::Other);
        let importance = r.importance.unwrap_or(if r.core {
            DEFAULT_CORE_IMPORTANCE
        } else {
            DEFAULT_OPTIONAL_IMPORTANCE
        });
        aspects.push(Aspect::new(r.name, aspect_type, importance, r.keywords));
        if aspects.len() >= MAX_ASPECTS {
            break;
        }
    }
    if aspects.is_empty() {
        return Err("no valid aspects in response".to_string());
    }
    Ok(aspects)
}

fn extract_json_array(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

fn preview(text: &str) -> String {
    text.chars().take(200).collect()
}

/// Sorts aspects importance-descending; ties keep their original
/// (appearance) order via a stable sort.
fn order_aspects(mut aspects: Vec<Aspect>) -> Vec<Aspect> {
    aspects.sort_by(|a, b| b.importance.partial_cmp(&a.importance).unwrap());
    aspects
}

const COMPARISON_PATTERNS: &[&str] = &["compare", "vs", "vs.", "versus"];

/// Pattern-driven fallback extraction, used when the LLM is absent or its
/// output never parses. Never returns an empty vector.
fn extract_heuristic(question: &str) -> Vec<Aspect> {
    let lowered = question.to_lowercase();

    if let Some((left, right)) = split_comparison(&lowered, question) {
        return vec![
            Aspect::new(
                format!("Definition of {left}"),
                AspectType::Definition,
                DEFAULT_CORE_IMPORTANCE,
                content_words(&left),
            ),
            Aspect::new(
                format!("Definition of {right}"),
                AspectType::Definition,
                DEFAULT_CORE_IMPORTANCE,
                content_words(&right),
            ),
            Aspect::new(
                format!("Comparison between {left} and {right}"),
                AspectType::Comparison,
                DEFAULT_CORE_IMPORTANCE,
                [content_words(&left), content_words(&right)].concat(),
            ),
        ];
    }

    if let Some(topic) = extract_what_is_topic(&lowered, question) {
        return vec![Aspect::new(
            format!("Definition of {topic}"),
            AspectType::Definition,
            DEFAULT_CORE_IMPORTANCE,
            content_words(&topic),
        )];
    }

    vec![Aspect::new(
        question.trim(),
        AspectType::Other,
        DEFAULT_CORE_IMPORTANCE,
        content_words(question),
    )]
}

/// Finds `"X vs Y"` / `"compare X and Y"` style phrasing. Returns the two
/// sides with original casing preserved where possible.
fn split_comparison(lowered: &str, original: &str) -> Option<(String, String)> {
    for marker in [" vs. ", " vs ", " versus "] {
        if let Some(idx) = lowered.find(marker) {
            let left = original[..idx].trim();
            let right = original[idx + marker.len()..].trim().trim_end_matches('?');
            let left = strip_leading_compare_verb(left);
            if !left.is_empty() && !right.is_empty() {
                return Some((left.to_string(), right.to_string()));
            }
        }
    }
    if lowered.starts_with("compare ") {
        let rest = &original[8..].trim_end_matches('?');
        if let Some(idx) = rest.to_lowercase().find(" and ") {
            let left = rest[..idx].trim();
            let right = rest[idx + 5..].trim();
            if !left.is_empty() && !right.is_empty() {
                return Some((left.to_string(), right.to_string()));
            }
        }
    }
    None
}

fn strip_leading_compare_verb(s: &str) -> &str {
    let lowered = s.to_lowercase();
    if let Some(rest) = lowered.strip_prefix("compare ") {
        &s[s.len() - rest.len()..]
    } else {
        s
    }
}

/// Matches `"What is X?"` / `"What are X?"`, returning `X`.
fn extract_what_is_topic(lowered: &str, original: &str) -> Option<String> {
    for prefix in ["what is ", "what are ", "what's "] {
        if lowered.starts_with(prefix) {
            let topic = original[prefix.len()..].trim().trim_end_matches('?').trim();
            if !topic.is_empty() {
                return Some(topic.to_string());
            }
        }
    }
    None
}

const STOPWORDS: &[&str] = &[
    "a", "an", "the", "is", "are", "of", "in", "on", "to", "and", "or", "what", "how", "why",
    "do", "does", "for", "with", "vs", "vs.", "versus", "compare", "between",
];

/// Extracts lowercased content words (stopwords and punctuation stripped)
/// from `text`, used as keyword seeds for heuristic aspects.
fn content_words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty() && !STOPWORDS.contains(w))
        .map(|w| w.to_string())
        .collect()
}
