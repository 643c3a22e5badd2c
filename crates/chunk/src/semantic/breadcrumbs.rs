//! Ancestor-heading context for pieces cut from inside a section.

use super::tree::{headings, parse_heading};
use crate::tokenizer::Tokenizer;

const MAX_LEVEL: usize = 6;

/// Prefix each piece with the headings above it and drop heading-only pieces.
///
/// The prefix is a single `# A - B` line naming the open headings of a
/// higher level than the piece's own top heading. It is only added when the
/// result still fits `budget`. Heading-only pieces still update the open
/// headings; they are dropped unless they are the only piece.
pub(crate) fn add_breadcrumbs(
    pieces: Vec<String>,
    budget: usize,
    tokenizer: &dyn Tokenizer,
) -> Vec<String> {
    let total = pieces.len();
    let mut open: [Option<String>; MAX_LEVEL] = Default::default();
    let mut out = Vec::with_capacity(total);

    for piece in pieces {
        let found = headings(&piece);
        let top = found
            .iter()
            .map(|(level, _)| *level as usize)
            .min()
            .unwrap_or(MAX_LEVEL + 1);

        let trail: Vec<&str> = open[..top - 1]
            .iter()
            .flatten()
            .map(String::as_str)
            .filter(|title| !title.is_empty())
            .collect();
        let prefix = (!trail.is_empty()).then(|| format!("# {}", trail.join(" - ")));

        for (level, title) in found {
            let index = level as usize - 1;
            open[index] = Some(title);
            for deeper in &mut open[index + 1..] {
                *deeper = None;
            }
        }

        if total > 1 && is_heading_only(&piece) {
            tracing::debug!("Dropping heading-only piece {:?}", piece.trim());
            continue;
        }

        match prefix {
            Some(prefix) => {
                let candidate = format!("{}\n\n{}", prefix, piece.trim_start());
                if tokenizer.count(candidate.trim()) <= budget {
                    out.push(candidate);
                } else {
                    tracing::debug!("Breadcrumb {:?} does not fit, left out", prefix);
                    out.push(piece);
                }
            }
            None => out.push(piece),
        }
    }

    out
}

fn is_heading_only(piece: &str) -> bool {
    let trimmed = piece.trim();
    !trimmed.contains('\n') && parse_heading(trimmed).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::TiktokenTokenizer;

    fn pieces(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_nested_sections_get_trail() {
        let tokenizer = TiktokenTokenizer::cl100k().unwrap();
        let out = add_breadcrumbs(
            pieces(&[
                "# Guide\n\nIntro.",
                "## Setup\n\nInstall it.",
                "More setup text without a heading.",
                "### Linux\n\nUse apt.",
                "## Usage\n\nRun it.",
            ]),
            100,
            &tokenizer,
        );

        assert_eq!(
            out,
            pieces(&[
                "# Guide\n\nIntro.",
                "# Guide\n\n## Setup\n\nInstall it.",
                "# Guide - Setup\n\nMore setup text without a heading.",
                "# Guide - Setup\n\n### Linux\n\nUse apt.",
                "# Guide\n\n## Usage\n\nRun it.",
            ])
        );
    }

    #[test]
    fn test_heading_only_pieces_dropped() {
        let tokenizer = TiktokenTokenizer::cl100k().unwrap();
        let out = add_breadcrumbs(
            pieces(&["# Guide", "## Setup", "Body text."]),
            100,
            &tokenizer,
        );
        assert_eq!(out, pieces(&["# Guide - Setup\n\nBody text."]));

        let single = add_breadcrumbs(pieces(&["# Only"]), 100, &tokenizer);
        assert_eq!(single, pieces(&["# Only"]));
    }

    #[test]
    fn test_trail_left_out_when_over_budget() {
        let tokenizer = TiktokenTokenizer::cl100k().unwrap();
        let body = "word ".repeat(20);
        let out = add_breadcrumbs(
            pieces(&["# A very long heading title here", body.trim()]),
            22,
            &tokenizer,
        );
        assert_eq!(out, pieces(&[body.trim()]));
    }
}
