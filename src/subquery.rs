//! Sub-query Generator — given the main question and the currently
//! uncovered aspects, produces one or more targeted sub-queries, each
//! tagged with its target aspect. LLM path pairs sub-queries with aspects
//! in one call per batch; missing pairs and the no-LLM case fall back to
//! per-aspect templates.

use serde::Deserialize;
use tracing::{debug, warn};

use deep_research_llm::{LlmClient, LlmRequestOptions};

use crate::model::{Aspect, AspectType};

const MAX_SUBQUERY_LEN: usize = 300;

/// One generated sub-query paired with the aspect it targets, plus whether
/// the LLM path produced it (vs. the template fallback).
#[derive(Debug, Clone)]
pub struct GeneratedSubQuery {
    pub text: String,
    pub aspect_name: String,
    pub llm_used: bool,
}

const SYSTEM_PROMPT: &str = "You write focused sub-queries for a research retrieval system. \
Respond with a JSON array only, no surrounding prose. Each element: \
{\"aspect\": string (must exactly match one of the given aspect names), \"query\": string}. \
Produce exactly one sub-query per given aspect.";

#[derive(Debug, Deserialize)]
struct RawPair {
    aspect: String,
    query: String,
}

/// `next_subqueries(question, uncovered_aspects, llm?, max) -> [(sub_query, aspect_name)]`.
/// `uncovered_aspects` must already be sorted importance-descending; only
/// the first `max` are used.
pub async fn next_subqueries(
    question: &str,
    uncovered_aspects: &[Aspect],
    llm: Option<&dyn LlmClient>,
    max: usize,
) -> Vec<GeneratedSubQuery> {
    let chosen: Vec<&Aspect> = uncovered_aspects.iter().take(max.max(1)).collect();
    if chosen.is_empty() {
        return Vec::new();
    }

    if let Some(client) = llm {
        if let Some(pairs) = generate_via_llm(client, question, &chosen).await {
            return fill_missing_with_templates(&chosen, pairs);
        }
    }

    chosen
        .iter()
        .map(|a| GeneratedSubQuery {
            text: template_for(a),
            aspect_name: a.name.clone(),
            llm_used: false,
        })
        .collect()
}

async fn generate_via_llm(
    client: &dyn LlmClient,
    question: &str,
    aspects: &[&Aspect],
) -> Option<Vec<RawPair>> {
    let user_prompt = build_user_prompt(question, aspects);
    let options = LlmRequestOptions {
        temperature_hint: Some(0.3),
        max_tokens_hint: Some(500),
    };

    let response = match client.generate(SYSTEM_PROMPT, &user_prompt, options.clone()).await {
        Ok(text) => text,
        Err(err) => {
            warn!(error = %err, "sub-query generation: LLM call failed");
            return None;
        }
    };
    debug!(preview = %response.chars().take(200).collect::<String>(), "sub-query generation: LLM response received");

    match parse_pairs(&response) {
        Ok(pairs) => Some(pairs),
        Err(parse_err) => {
            warn!(error = %parse_err, preview = %response.chars().take(200).collect::<String>(), "sub-query generation: parse failed, attempting repair");
            let repair_prompt = build_repair_prompt(&user_prompt, &response, &parse_err);
            match client.generate(SYSTEM_PROMPT, &repair_prompt, options).await {
                Ok(repaired_text) => match parse_pairs(&repaired_text) {
                    Ok(pairs) => Some(pairs),
                    Err(repair_err) => {
                        warn!(error = %repair_err, "sub-query generation: repair retry also failed to parse");
                        None
                    }
                },
                Err(err) => {
                    warn!(error = %err, "sub-query generation: repair retry call failed");
                    None
                }
            }
        }
    }
}

fn build_repair_prompt(original_prompt: &str, malformed: &str, parse_error: &str) -> String {
    format!(
        "{original_prompt}\n\nYour previous response could not be parsed as the required JSON \
         array. Parse error: {parse_error}\n\nPrevious response:\n{malformed}\n\n\
         Reply again with only a valid JSON array matching the required shape."
    )
}

fn build_user_prompt(question: &str, aspects: &[&Aspect]) -> String {
    let mut lines = vec![format!("Main question: {question}"), "Aspects:".to_string()];
    for a in aspects {
        let label = if a.is_core() { "core" } else { "optional" };
        lines.push(format!("- {} (type: {}, importance: {label})", a.name, a.aspect_type.as_str()));
    }
    lines.join("\n")
}

fn parse_pairs(text: &str) -> Result<Vec<RawPair>, String> {
    let start = text.find('[').ok_or("no JSON array found")?;
    let end = text.rfind(']').ok_or("no JSON array found")?;
    if end < start {
        return Err("malformed JSON array bounds".to_string());
    }
    serde_json::from_str(&text[start..=end]).map_err(|e| format!("invalid JSON: {e}"))
}

/// Matches LLM-produced pairs to the chosen aspects by exact (trimmed,
/// case-insensitive) name; any aspect without a match falls back to its
/// template, so a partially-successful LLM call never drops an aspect.
fn fill_missing_with_templates(chosen: &[&Aspect], pairs: Vec<RawPair>) -> Vec<GeneratedSubQuery> {
    chosen
        .iter()
        .map(|aspect| {
            let matched = pairs
                .iter()
                .find(|p| p.aspect.trim().eq_ignore_ascii_case(aspect.name.trim()));
            match matched {
                Some(pair) if !pair.query.trim().is_empty() => GeneratedSubQuery {
                    text: bound_length(&collapse_whitespace(&pair.query)),
                    aspect_name: aspect.name.clone(),
                    llm_used: true,
                },
                _ => GeneratedSubQuery {
                    text: template_for(aspect),
                    aspect_name: aspect.name.clone(),
                    llm_used: false,
                },
            }
        })
        .collect()
}

fn template_for(aspect: &Aspect) -> String {
    let topic = extract_topic(&aspect.name);
    let query = match aspect.aspect_type {
        AspectType::Definition => format!("What is {topic}?"),
        AspectType::Comparison => format!("What are the differences in {topic}?"),
        AspectType::Process => format!("How does {topic} work?"),
        AspectType::Causal => format!("Why is {topic} important?"),
        AspectType::Evaluation => format!("What are the pros and cons of {topic}?"),
        AspectType::Application => format!("What are the applications of {topic}?"),
        AspectType::Temporal | AspectType::Other => {
            let name = aspect.name.trim();
            if name.ends_with('?') {
                name.to_string()
            } else {
                format!("{name}?")
            }
        }
    };
    bound_length(&collapse_whitespace(&query))
}

const LEADING_PHRASES: &[&str] = &[
    "definition of ",
    "comparison between ",
    "comparison of ",
    "application of ",
    "applications of ",
];

/// Derives `topic` from an aspect name by stripping leading phrases like
/// "definition of" / "comparison between".
fn extract_topic(aspect_name: &str) -> String {
    let lowered = aspect_name.to_lowercase();
    for phrase in LEADING_PHRASES {
        if let Some(stripped) = lowered.strip_prefix(phrase) {
            return aspect_name[aspect_name.len() - stripped.len()..].to_string();
        }
    }
    aspect_name.to_string()
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn bound_length(s: &str) -> String {
    if s.chars().count() <= MAX_SUBQUERY_LEN {
        s.to_string()
    } else {
        s.chars().take(MAX_SUBQUERY_LEN).collect()
    }
}
