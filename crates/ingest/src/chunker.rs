//! Text chunking for embedding.
//!
//! Accumulates whole words up to a target chunk size, carrying a small tail
//! of the previous chunk forward as overlap so sentence fragments keep
//! their context. Splitting on words keeps every boundary UTF-8 safe.

/// Split `text` into chunks of roughly `chunk_size` characters with
/// roughly `overlap` characters repeated between neighbours.
pub fn split_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let chunk_size = chunk_size.max(1);
    let overlap = overlap.min(chunk_size / 2);

    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_len = 0usize;

    for word in &words {
        let word_len = word.chars().count();
        let sep = usize::from(!current.is_empty());

        if current_len + sep + word_len > chunk_size && !current.is_empty() {
            chunks.push(current.join(" "));

            // Seed the next chunk with the tail of this one.
            let mut tail: Vec<&str> = Vec::new();
            let mut tail_len = 0usize;
            for w in current.iter().rev() {
                let w_len = w.chars().count();
                if tail_len + w_len > overlap {
                    break;
                }
                tail_len += w_len + 1;
                tail.push(w);
            }
            tail.reverse();
            current_len = tail.iter().map(|w| w.chars().count() + 1).sum();
            current = tail;
        }

        current_len += usize::from(!current.is_empty()) + word_len;
        current.push(word);
    }

    if !current.is_empty() {
        chunks.push(current.join(" "));
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_one_chunk() {
        let chunks = split_text("just a few words", 200, 25);
        assert_eq!(chunks, vec!["just a few words"]);
    }

    #[test]
    fn empty_text_yields_nothing() {
        assert!(split_text("", 200, 25).is_empty());
        assert!(split_text("   \n\t ", 200, 25).is_empty());
    }

    #[test]
    fn long_text_splits_near_target_size() {
        let text = "word ".repeat(200);
        let chunks = split_text(&text, 200, 25);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 200, "chunk too long: {}", chunk.len());
        }
    }

    #[test]
    fn neighbours_share_overlap() {
        let text = (0..100).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ");
        let chunks = split_text(&text, 60, 15);
        assert!(chunks.len() > 1);

        // The start of each chunk repeats the tail of the previous one.
        for pair in chunks.windows(2) {
            let first_word = pair[1].split_whitespace().next().unwrap();
            assert!(pair[0].contains(first_word));
        }
    }

    #[test]
    fn no_word_is_ever_split() {
        let text = "supercalifragilistic expialidocious ".repeat(20);
        let chunks = split_text(&text, 50, 10);
        for chunk in &chunks {
            for word in chunk.split_whitespace() {
                assert!(
                    word == "supercalifragilistic" || word == "expialidocious",
                    "word was split: {word}"
                );
            }
        }
    }

    #[test]
    fn multibyte_text_is_handled() {
        let text = "héllo wörld ünïcode tëxt ".repeat(30);
        let chunks = split_text(&text, 40, 10);
        assert!(chunks.len() > 1);
        // join/split on char boundaries means this never panics
        for chunk in &chunks {
            assert!(!chunk.is_empty());
        }
    }
}
