//! Detection of text spans that must never be cut in the middle.
//!
//! Protected spans are fenced code blocks, inline code, Markdown links and
//! images, autolinks, bare URLs, e-mail addresses and reference definitions.
//! Offsets are byte ranges into the scanned text.

use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

static INLINE_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"``[^`]+``|`[^`\n]+`").expect("valid inline code pattern"));

static LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    // Targets may hold one level of balanced parentheses
    Regex::new(r#"!?\[[^\]\n]*\]\((?:[^()\s]|\([^()\s]*\))*(?:\s+"[^"\n]*")?\)"#)
        .expect("valid link pattern")
});

static AUTOLINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<(?:https?|ftp|mailto):[^>\s]+>").expect("valid autolink pattern")
});

static BARE_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:https?://|www\.)[^\s<>\[\]]+").expect("valid url pattern")
});

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").expect("valid email pattern")
});

static REFERENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^ {0,3}\[[^\]\n]+\]:[ \t]*\S+[^\n]*").expect("valid reference pattern")
});

/// Opening fence of a fenced code block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Fence {
    marker: char,
    len: usize,
}

impl Fence {
    /// Fence opened by `line`, if any.
    pub(crate) fn open(line: &str) -> Option<Self> {
        let indent = line.len() - line.trim_start_matches(' ').len();
        if indent > 3 {
            return None;
        }
        let rest = &line[indent..];
        let marker = rest.chars().next().filter(|c| *c == '`' || *c == '~')?;
        let len = rest.chars().take_while(|c| *c == marker).count();
        if len < 3 {
            return None;
        }
        // Backtick fences may not carry backticks in the info string
        if marker == '`' && rest[len..].contains('`') {
            return None;
        }
        Some(Self { marker, len })
    }

    /// Whether `line` closes this fence.
    pub(crate) fn closed_by(&self, line: &str) -> bool {
        let trimmed = line.trim_end();
        let indent = trimmed.len() - trimmed.trim_start_matches(' ').len();
        if indent > 3 {
            return false;
        }
        let rest = &trimmed[indent..];
        let len = rest.chars().take_while(|c| *c == self.marker).count();
        len >= self.len && rest.len() == len * self.marker.len_utf8()
    }
}

/// Byte ranges of fenced code blocks, each covering its fence lines.
///
/// An unclosed fence runs to the end of the text.
pub fn fenced_blocks(text: &str) -> Vec<Range<usize>> {
    let mut blocks = Vec::new();
    let mut open: Option<(Fence, usize)> = None;
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        let content = line.trim_end_matches(['\n', '\r']);
        match open {
            None => {
                if let Some(fence) = Fence::open(content) {
                    open = Some((fence, offset));
                }
            }
            Some((fence, start)) => {
                if fence.closed_by(content) {
                    blocks.push(start..offset + content.len());
                    open = None;
                }
            }
        }
        offset += line.len();
    }

    if let Some((_, start)) = open {
        blocks.push(start..text.len());
    }
    blocks
}

/// Whether `text` is a single fenced code block, ignoring surrounding whitespace.
pub(crate) fn is_fenced_block(text: &str) -> bool {
    let trimmed = text.trim();
    matches!(fenced_blocks(trimmed).as_slice(), [block] if block.start == 0 && block.end == trimmed.len())
}

/// All protected spans in `text`, sorted and merged where they overlap.
pub fn protected_spans(text: &str) -> Vec<Range<usize>> {
    let mut spans = fenced_blocks(text);

    for re in [
        &*INLINE_CODE_RE,
        &*LINK_RE,
        &*AUTOLINK_RE,
        &*EMAIL_RE,
        &*REFERENCE_RE,
    ] {
        spans.extend(re.find_iter(text).map(|m| m.range()));
    }

    spans.extend(BARE_URL_RE.find_iter(text).map(|m| {
        let url = trim_url(m.as_str());
        m.start()..m.start() + url.len()
    }));

    merge_spans(spans)
}

/// The span strictly containing `offset`, if any.
pub fn enclosing_span(spans: &[Range<usize>], offset: usize) -> Option<&Range<usize>> {
    spans
        .iter()
        .find(|span| span.start < offset && offset < span.end)
}

/// Drop trailing sentence punctuation and unbalanced closing parentheses.
fn trim_url(url: &str) -> &str {
    let mut url = url;
    loop {
        let trimmed = url.trim_end_matches(['.', ',', ';', ':', '!', '?', '\'', '"', '*', '_']);
        let trimmed = if trimmed.ends_with(')')
            && trimmed.matches(')').count() > trimmed.matches('(').count()
        {
            &trimmed[..trimmed.len() - 1]
        } else {
            trimmed
        };
        if trimmed.len() == url.len() {
            return url;
        }
        url = trimmed;
    }
}

fn merge_spans(mut spans: Vec<Range<usize>>) -> Vec<Range<usize>> {
    spans.retain(|span| span.start < span.end);
    spans.sort_by_key(|span| (span.start, span.end));

    let mut merged: Vec<Range<usize>> = Vec::with_capacity(spans.len());
    for span in spans {
        match merged.last_mut() {
            Some(last) if span.start < last.end => last.end = last.end.max(span.end),
            _ => merged.push(span),
        }
    }
    merged
}
