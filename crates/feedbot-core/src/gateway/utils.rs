//! Shared gateway utilities.

/// Split `text` into pieces of at most `max_chars` characters.
///
/// Breaks after the last newline that fits when there is one, otherwise
/// hard-splits. Counting is in `char`s so multi-byte emoji are never cut.
pub fn chunk_message(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut remaining = text;

    loop {
        // Byte offset just past the first `max_chars` chars, if there are more.
        let Some((limit, _)) = remaining.char_indices().nth(max_chars) else {
            chunks.push(remaining.to_owned());
            break;
        };

        let window = &remaining[..limit];
        let split = match window.rfind('\n') {
            Some(0) | None => limit,
            Some(nl) => nl,
        };

        chunks.push(remaining[..split].to_owned());
        remaining = remaining[split..].trim_start_matches('\n');
        if remaining.is_empty() {
            break;
        }
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_message_is_one_chunk() {
        assert_eq!(chunk_message("AAPL 🟢", 4096), vec!["AAPL 🟢"]);
        assert_eq!(chunk_message("", 4096), vec![""]);
    }

    #[test]
    fn test_hard_split() {
        let long = "a".repeat(5000);
        let chunks = chunk_message(&long, 4096);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].len(), 4096);
        assert_eq!(chunks[1].len(), 904);
    }

    #[test]
    fn test_prefers_newline() {
        let text = format!("{}\n{}", "a".repeat(100), "b".repeat(100));
        let chunks = chunk_message(&text, 150);
        assert_eq!(chunks, vec!["a".repeat(100), "b".repeat(100)]);
    }

    #[test]
    fn test_counts_chars_not_bytes() {
        // Each emoji is four bytes.
        let text = "🟢".repeat(10);
        let chunks = chunk_message(&text, 4);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0], "🟢".repeat(4));
        assert_eq!(chunks[2], "🟢".repeat(2));
    }
}
