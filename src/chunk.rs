//! Bounded-size message chunking.
//!
//! Discord rejects messages over the per-message character limit, so
//! outbound text is split into an ordered sequence of chunks before
//! transmission. The transport sends chunks strictly in order.

/// How chunk boundaries are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChunkMode {
    /// Prefer line boundaries; hard-split only lines longer than the budget.
    #[default]
    Auto,
    /// Cut at exactly the character budget, ignoring line structure.
    Hard,
}

/// Split `text` into ordered chunks of at most `max_chars` characters.
///
/// `max_lines`, when set, additionally caps the number of lines per chunk
/// (only meaningful in [`ChunkMode::Auto`]). Empty input yields an empty
/// vector; callers that must transmit something handle that case themselves.
pub fn chunk_text(
    text: &str,
    max_chars: usize,
    max_lines: Option<usize>,
    mode: ChunkMode,
) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    let budget = max_chars.max(1);

    match mode {
        ChunkMode::Hard => hard_split(text, budget),
        ChunkMode::Auto => line_split(text, budget, max_lines),
    }
}

/// Cut `text` into pieces of exactly `budget` characters (last piece shorter).
fn hard_split(text: &str, budget: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut count: usize = 0;

    for ch in text.chars() {
        current.push(ch);
        count = count.saturating_add(1);
        if count >= budget {
            chunks.push(std::mem::take(&mut current));
            count = 0;
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Accumulate whole lines into chunks, hard-splitting oversized lines.
fn line_split(text: &str, budget: usize, max_lines: Option<usize>) -> Vec<String> {
    let line_cap = max_lines.map(|n| n.max(1));
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_chars: usize = 0;
    let mut current_lines: usize = 0;

    for line in text.split('\n') {
        let line_chars = line.chars().count();

        // A single line over the budget gets hard-split into its own chunks.
        if line_chars > budget {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_chars = 0;
                current_lines = 0;
            }
            chunks.extend(hard_split(line, budget));
            continue;
        }

        let separator: usize = usize::from(!current.is_empty());
        let candidate = current_chars
            .saturating_add(separator)
            .saturating_add(line_chars);
        let line_cap_hit = line_cap.is_some_and(|cap| current_lines >= cap);

        if !current.is_empty() && (candidate > budget || line_cap_hit) {
            chunks.push(std::mem::take(&mut current));
            current_chars = 0;
            current_lines = 0;
        }

        if !current.is_empty() {
            current.push('\n');
            current_chars = current_chars.saturating_add(1);
        }
        current.push_str(line);
        current_chars = current_chars.saturating_add(line_chars);
        current_lines = current_lines.saturating_add(1);
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
