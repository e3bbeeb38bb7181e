//! Prompt builders for the four reasoning calls

use super::Evidence;

/// Render analyzed files into the evidence bundle format
pub(crate) fn render_evidence(evidence: &[Evidence<'_>]) -> String {
    evidence
        .iter()
        .map(|e| format!("File: {}\n```\n{}\n```", e.path, e.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub(crate) fn classification_prompt(query: &str, cached_paths: &[String]) -> String {
    let memory_info = if cached_paths.is_empty() {
        String::new()
    } else {
        let listing: Vec<String> = cached_paths.iter().map(|p| format!("- {}", p)).collect();
        format!(
            "\n\nCurrently loaded files in memory:\n{}",
            listing.join("\n")
        )
    };

    format!(
        r#"You are a query classifier for a code analysis assistant. Determine if the user's query requires searching and analyzing code files, or can be answered directly with general programming knowledge.

User Query: {}{}

Instructions:
- Respond "SEARCH_CODE" if the query asks about:
  * Specific implementation details in THIS codebase
  * How a particular feature works in THIS project
  * Where something is located in the code
  * Code structure, architecture, or organization
  * Debugging or understanding existing code

- Note that the assistant cannot access the codebase unless instructed to search it, so if the query requires anything from the codebase it must be classified as "SEARCH_CODE".

- Respond "USE_MEMORY" if the query references information from currently loaded files (follow-up questions)

- Respond "DIRECT" if the query is:
  * A general programming question not specific to this codebase
  * A theoretical or conceptual question
  * A greeting or casual conversation

Respond in JSON format:
{{"action": "SEARCH_CODE|USE_MEMORY|DIRECT", "reason": "brief explanation"}}"#,
        query, memory_info
    )
}

pub(crate) fn selection_prompt(
    query: &str,
    overview: &str,
    already_analyzed: &[String],
    cached_paths: &[String],
    suggested_term: Option<&str>,
    max_files: usize,
) -> String {
    let already = if already_analyzed.is_empty() {
        String::new()
    } else {
        let listing: Vec<String> = already_analyzed.iter().map(|p| format!("- {}", p)).collect();
        format!(
            "\n\nFiles already analyzed in this search:\n{}",
            listing.join("\n")
        )
    };

    // Cached but not yet part of this query's evidence
    let cached: Vec<String> = cached_paths
        .iter()
        .filter(|p| !already_analyzed.contains(p))
        .map(|p| format!("- {}", p))
        .collect();
    let memory = if cached.is_empty() {
        String::new()
    } else {
        format!(
            "\n\nFiles in cache (available instantly):\n{}",
            cached.join("\n")
        )
    };

    let focus = suggested_term
        .map(|t| format!("\nRefined search focus: {}", t))
        .unwrap_or_default();

    format!(
        r#"You are a code analysis assistant helping to find relevant files.

Available files:
{}{}{}

User Question: {}{}

Task: Select up to {} NEW files that would help answer this question.
- Focus on files NOT already analyzed
- Prefer files from cache if they're relevant
- Consider file names, extensions, and typical project structure
- If the already analyzed files are enough to answer, return an empty list

Respond in JSON format:
{{"files": ["path1", "path2"], "reasoning": "why these files", "sufficient": true/false}}

Set "sufficient": true if already analyzed files are enough to answer the question."#,
        overview, already, memory, query, focus, max_files
    )
}

pub(crate) fn confidence_prompt(query: &str, evidence: &[Evidence<'_>]) -> String {
    format!(
        r#"You are assessing whether the gathered code files contain enough evidence to answer a question.

Question: {}

Files gathered so far:
{}

Instructions:
1. Rate confidence: HIGH, MEDIUM, or LOW
   - HIGH: The files directly contain the information needed, with clear evidence
   - MEDIUM: The files partially cover the question but more context might help
   - LOW: The files do not cover the question or important files are missing

2. If confidence is not HIGH, suggest a short search term or file-name hint that could find the missing code. Suggest a term, not a command.

Respond in JSON format:
{{"confidence": "HIGH|MEDIUM|LOW", "reason": "brief explanation", "suggestion": "what to search next or null"}}"#,
        query,
        render_evidence(evidence)
    )
}

pub(crate) fn answer_prompt(query: &str, evidence: &[Evidence<'_>]) -> String {
    format!(
        r#"You are a code analysis assistant. Answer the question based on the provided code files.

Code Context:
{}

Instructions:
- Provide accurate, detailed analysis based on the code
- Reference specific files, functions, and line numbers when possible
- If information is incomplete, clearly state what's missing
- Consider conversation history for follow-up questions
- Be concise but thorough
- Never ask the user about the codebase. If you really don't know, respond with "I don't know." instead of making up an answer.

User Question: {}

Answer:"#,
        render_evidence(evidence),
        query
    )
}

pub(crate) fn direct_prompt(query: &str) -> String {
    format!(
        r#"You are a helpful programming assistant for users exploring a specific codebase. Answer the following question using your general knowledge. If the user seems confused, suggest asking something about the codebase.

User Question: {}

Instructions:
- Provide clear, accurate information about programming concepts
- Include code examples if helpful
- Be concise but thorough
- Consider conversation history for context

Answer:"#,
        query
    )
}
