//! Merging of undersized pieces.

use crate::tokenizer::Tokenizer;

/// Join two pieces with a paragraph break.
pub(crate) fn join_pieces(first: &str, second: &str) -> String {
    format!("{}\n\n{}", first.trim_end(), second.trim_start())
}

/// Merge pieces below `min_tokens` into a neighbour when the result fits `budget`.
///
/// An undersized piece goes into the following piece, or into the preceding
/// one when it is last. Pieces that cannot be merged are kept as they are.
pub(crate) fn merge_undersized(
    pieces: Vec<String>,
    min_tokens: usize,
    budget: usize,
    tokenizer: &dyn Tokenizer,
) -> Vec<String> {
    let mut pending: Vec<String> = pieces
        .into_iter()
        .filter(|piece| !piece.trim().is_empty())
        .collect();
    pending.reverse();

    let mut merged: Vec<String> = Vec::new();
    while let Some(current) = pending.pop() {
        if tokenizer.count(current.trim()) >= min_tokens {
            merged.push(current);
            continue;
        }

        match pending.last_mut() {
            Some(next) => {
                let candidate = join_pieces(&current, next);
                if tokenizer.count(&candidate) <= budget {
                    *next = candidate;
                } else {
                    merged.push(current);
                }
            }
            None => match merged.last_mut() {
                Some(previous) => {
                    let candidate = join_pieces(previous, &current);
                    if tokenizer.count(&candidate) <= budget {
                        *previous = candidate;
                    } else {
                        merged.push(current);
                    }
                }
                None => merged.push(current),
            },
        }
    }

    merged
}

/// Drop pieces still below `min_tokens`, unless only one piece remains.
pub(crate) fn drop_undersized(
    pieces: Vec<String>,
    min_tokens: usize,
    tokenizer: &dyn Tokenizer,
) -> Vec<String> {
    if pieces.len() <= 1 {
        return pieces;
    }

    pieces
        .into_iter()
        .filter(|piece| {
            let tokens = tokenizer.count(piece.trim());
            if tokens < min_tokens {
                tracing::warn!(
                    "Discarding piece of {} tokens (minimum {}) that could not be merged: {:?}",
                    tokens,
                    min_tokens,
                    piece.trim().chars().take(60).collect::<String>()
                );
                false
            } else {
                true
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::TiktokenTokenizer;

    fn words(n: usize) -> String {
        vec!["word"; n].join(" ")
    }

    #[test]
    fn test_small_piece_merges_forward() {
        let tokenizer = TiktokenTokenizer::cl100k().unwrap();
        let pieces = vec!["# Heading".to_string(), words(20), words(20)];

        let merged = merge_undersized(pieces, 5, 30, &tokenizer);
        assert_eq!(merged.len(), 2);
        assert!(merged[0].starts_with("# Heading\n\nword"));
    }

    #[test]
    fn test_last_piece_merges_backward() {
        let tokenizer = TiktokenTokenizer::cl100k().unwrap();
        let pieces = vec![words(20), "tail".to_string()];

        let merged = merge_undersized(pieces, 5, 30, &tokenizer);
        assert_eq!(merged, vec![format!("{}\n\ntail", words(20))]);
    }

    #[test]
    fn test_chain_of_small_pieces() {
        let tokenizer = TiktokenTokenizer::cl100k().unwrap();
        let pieces: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();

        let merged = merge_undersized(pieces, 5, 30, &tokenizer);
        assert_eq!(merged, vec!["a\n\nb\n\nc\n\nd".to_string()]);
    }

    #[test]
    fn test_unmergeable_piece_is_kept_then_dropped() {
        let tokenizer = TiktokenTokenizer::cl100k().unwrap();
        let pieces = vec!["tiny".to_string(), words(30)];

        let merged = merge_undersized(pieces, 5, 30, &tokenizer);
        assert_eq!(merged.len(), 2);

        let kept = drop_undersized(merged, 5, &tokenizer);
        assert_eq!(kept, vec![words(30)]);
    }

    #[test]
    fn test_single_piece_never_dropped() {
        let tokenizer = TiktokenTokenizer::cl100k().unwrap();
        let kept = drop_undersized(vec!["tiny".to_string()], 5, &tokenizer);
        assert_eq!(kept, vec!["tiny".to_string()]);
    }
}
