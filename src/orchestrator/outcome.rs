/// Marker a model emits to ask for a retrieval.
pub const RETRIEVE_SENTINEL: &str = "RETRIEVE";

/// What a completion asks the orchestrator to do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionOutcome {
    FinalAnswer(String),
    /// Retrieval query; may be empty when the directive carried none
    ToolRequest(String),
}

impl CompletionOutcome {
    /// Classify completion text. The only place the sentinel is detected.
    ///
    /// The query is the text between the first sentinel and the next one
    /// (or the end), trimmed, without a leading `:` or surrounding quotes.
    pub fn parse(text: &str) -> Self {
        let Some(start) = text.find(RETRIEVE_SENTINEL) else {
            return CompletionOutcome::FinalAnswer(text.to_string());
        };

        let rest = &text[start + RETRIEVE_SENTINEL.len()..];
        let segment = rest
            .find(RETRIEVE_SENTINEL)
            .map_or(rest, |end| &rest[..end]);
        let query = segment.trim();
        let query = query.strip_prefix(':').unwrap_or(query).trim();

        CompletionOutcome::ToolRequest(strip_quotes(query).to_string())
    }
}

fn strip_quotes(s: &str) -> &str {
    for (open, close) in [('"', '"'), ('\u{201c}', '\u{201d}'), ('\'', '\'')] {
        if let Some(inner) = s.strip_prefix(open).and_then(|t| t.strip_suffix(close)) {
            return inner.trim();
        }
    }
    s
}
