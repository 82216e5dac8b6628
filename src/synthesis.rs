//! Answer Synthesizer — combines the hop log into a final answer plus
//! citations. LLM mode builds a structured prompt from per-hop extractive
//! summaries and the coverage snapshot; deterministic mode concatenates one
//! paragraph per covered aspect. Always produces an answer, even with zero
//! passages anywhere.

use std::collections::BTreeMap;

use tracing::warn;

use deep_research_core::Passage;
use deep_research_llm::{LlmClient, LlmRequestOptions};

use crate::model::{Citation, Coverage, SubQueryRecord};

const SNIPPET_RADIUS: usize = 120;
const MAX_ANSWER_LEN: usize = 4000;

const SYSTEM_PROMPT: &str = "You write a final research answer from retrieved evidence. \
Cite passages inline using their given short identifiers, e.g. [#3]. Be concise and \
only state what the evidence supports. If an aspect lacks evidence, say so plainly.";

/// Synthesizes the final answer. Returns `(answer, used_llm)`.
pub async fn synthesize(
    question: &str,
    hop_log: &[SubQueryRecord],
    coverage: &Coverage,
    llm: Option<&dyn LlmClient>,
) -> (String, bool) {
    if let Some(client) = llm {
        match synthesize_via_llm(client, question, hop_log, coverage).await {
            Some(answer) => return (answer, true),
            None => warn!("synthesis: LLM path failed, falling back to deterministic synthesis"),
        }
    }
    (synthesize_deterministic(hop_log, coverage), false)
}

async fn synthesize_via_llm(
    client: &dyn LlmClient,
    question: &str,
    hop_log: &[SubQueryRecord],
    coverage: &Coverage,
) -> Option<String> {
    let user_prompt = build_synthesis_prompt(question, hop_log, coverage);
    let options = LlmRequestOptions {
        temperature_hint: Some(0.2),
        max_tokens_hint: Some(1200),
    };
    match client.generate(SYSTEM_PROMPT, &user_prompt, options).await {
        Ok(text) if !text.trim().is_empty() => Some(bound_length(text.trim())),
        Ok(_) => {
            warn!("synthesis: LLM returned empty text");
            None
        }
        Err(err) => {
            warn!(error = %err, "synthesis: LLM call failed");
            None
        }
    }
}

fn build_synthesis_prompt(question: &str, hop_log: &[SubQueryRecord], coverage: &Coverage) -> String {
    let mut lines = vec![format!("Main question: {question}"), String::new(), "Hops:".to_string()];
    for hop in hop_log {
        lines.push(format!("Hop {} - sub-query: {}", hop.hop, hop.sub_query));
        for passage in hop.passages.iter().take(3) {
            lines.push(format!("  [#{}] {}", passage.id, extractive_summary(passage)));
        }
    }
    lines.push(String::new());
    lines.push("Coverage snapshot:".to_string());
    for entry in coverage.values() {
        lines.push(format!(
            "- {}: score {:.2}{}",
            entry.aspect.name,
            entry.score,
            if entry.covered_at_hop.is_some() { " (covered)" } else { " (not fully covered)" }
        ));
    }
    lines.join("\n")
}

fn extractive_summary(passage: &Passage) -> String {
    let text = passage.text.trim();
    if text.chars().count() <= 200 {
        text.to_string()
    } else {
        format!("{}...", text.chars().take(200).collect::<String>())
    }
}

/// One paragraph per covered aspect, built from the top-scoring passage for
/// that aspect's triggering hop. Aspects that never crossed the cover
/// threshold are listed as "not fully covered". If no passages were
/// retrieved at all, states that plainly and lists every aspect as
/// uncovered.
fn synthesize_deterministic(hop_log: &[SubQueryRecord], coverage: &Coverage) -> String {
    let any_passages = hop_log.iter().any(|h| !h.passages.is_empty());

    let mut covered_paragraphs = Vec::new();
    let mut uncovered_names = Vec::new();

    for entry in coverage.values() {
        if let Some(hop_number) = entry.covered_at_hop {
            if let Some(top_passage) = best_passage_for_hop(hop_log, hop_number) {
                covered_paragraphs.push(format!(
                    "{}: {} [#{}]",
                    entry.aspect.name,
                    extractive_summary(top_passage),
                    top_passage.id
                ));
                continue;
            }
        }
        uncovered_names.push(entry.aspect.name.clone());
    }

    let mut parts = Vec::new();
    if !any_passages {
        parts.push("No passages were retrieved for this question.".to_string());
    }
    if covered_paragraphs.is_empty() && uncovered_names.is_empty() && coverage.is_empty() {
        parts.push(
            "No aspects were extracted from the question; the main question itself was used as the only sub-query.".to_string(),
        );
    }
    parts.extend(covered_paragraphs);
    if !uncovered_names.is_empty() {
        parts.push(format!("Not fully covered: {}.", uncovered_names.join(", ")));
    }
    if parts.is_empty() {
        parts.push("No evidence was found to answer this question.".to_string());
    }

    bound_length(&parts.join("\n\n"))
}

fn best_passage_for_hop(hop_log: &[SubQueryRecord], hop_number: u32) -> Option<&Passage> {
    hop_log
        .iter()
        .find(|h| h.hop == hop_number)
        .and_then(|h| h.passages.iter().max_by(|a, b| a.score.partial_cmp(&b.score).unwrap()))
}

fn bound_length(s: &str) -> String {
    if s.chars().count() <= MAX_ANSWER_LEN {
        s.to_string()
    } else {
        s.chars().take(MAX_ANSWER_LEN).collect()
    }
}

/// Dedups passages by id across all hops, keeping the highest score seen,
/// and builds the citation list with a snippet taken from around the first
/// keyword hit (falling back to the start of the text when no aspect
/// keywords are available).
pub fn build_citations(hop_log: &[SubQueryRecord], coverage: &Coverage) -> Vec<Citation> {
    let all_keywords: Vec<String> = coverage
        .values()
        .flat_map(|e| e.aspect.keywords.clone())
        .collect();

    let mut best: BTreeMap<String, Passage> = BTreeMap::new();
    for hop in hop_log {
        for passage in &hop.passages {
            best.entry(passage.id.clone())
                .and_modify(|existing| {
                    if passage.score > existing.score {
                        *existing = passage.clone();
                    }
                })
                .or_insert_with(|| passage.clone());
        }
    }

    let mut citations: Vec<Citation> = best
        .into_values()
        .map(|p| Citation {
            id: p.id.clone(),
            title: p.title.clone(),
            filename: p.filename.clone(),
            score: p.score,
            snippet: snippet_around_keyword(&p.text, &all_keywords),
        })
        .collect();
    citations.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());
    citations
}

fn snippet_around_keyword(text: &str, keywords: &[String]) -> String {
    let lower = text.to_lowercase();
    let hit_pos = keywords
        .iter()
        .filter_map(|k| lower.find(k.as_str()))
        .min();

    match hit_pos {
        Some(pos) => {
            let start = pos.saturating_sub(SNIPPET_RADIUS);
            let end = (pos + SNIPPET_RADIUS).min(text.len());
            let start = nearest_char_boundary(text, start);
            let end = nearest_char_boundary(text, end);
            text[start..end].trim().to_string()
        }
        None => text.chars().take(240).collect(),
    }
}

fn nearest_char_boundary(text: &str, mut idx: usize) -> usize {
    while idx < text.len() && !text.is_char_boundary(idx) {
        idx += 1;
    }
    idx.min(text.len())
}
