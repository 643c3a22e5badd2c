//! Heading tree of a Markdown document.

use crate::protect::Fence;

/// A heading section and its subsections.
///
/// Concatenating `heading_line`, `body` and the children's text in order
/// reproduces the source exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentNode {
    /// 0 for the document root, 1-6 for headings
    pub heading_level: u8,

    /// Heading title without the `#` markers
    pub heading_text: Option<String>,

    /// Heading line as written, including its line break
    pub heading_line: String,

    /// Text between the heading and the first subsection
    pub body: String,

    pub children: Vec<DocumentNode>,
}

impl DocumentNode {
    /// Parse ATX headings outside fenced code blocks into a tree.
    pub fn parse(text: &str) -> Self {
        // Open nodes from the root down to the current section
        let mut stack = vec![DocumentNode::default()];
        let mut fence: Option<Fence> = None;

        for line in text.split_inclusive('\n') {
            let content = line.trim_end_matches(['\n', '\r']);

            if let Some(open) = fence {
                if open.closed_by(content) {
                    fence = None;
                }
                push_body(&mut stack, line);
                continue;
            }
            if let Some(open) = Fence::open(content) {
                fence = Some(open);
                push_body(&mut stack, line);
                continue;
            }

            match parse_heading(content) {
                Some((level, title)) => {
                    close_until(&mut stack, level);
                    stack.push(DocumentNode {
                        heading_level: level,
                        heading_text: Some(title),
                        heading_line: line.to_string(),
                        body: String::new(),
                        children: Vec::new(),
                    });
                }
                None => push_body(&mut stack, line),
            }
        }

        close_until(&mut stack, 1);
        stack.pop().unwrap_or_default()
    }

    /// Heading line and body, without subsections.
    pub fn section(&self) -> String {
        format!("{}{}", self.heading_line, self.body)
    }

    /// Full text of this node and all its subsections.
    pub fn text(&self) -> String {
        let mut text = self.section();
        for child in &self.children {
            text.push_str(&child.text());
        }
        text
    }
}

fn push_body(stack: &mut [DocumentNode], line: &str) {
    if let Some(current) = stack.last_mut() {
        current.body.push_str(line);
    }
}

/// Close open sections at `level` or deeper, attaching each to its parent.
fn close_until(stack: &mut Vec<DocumentNode>, level: u8) {
    while stack.len() > 1 && stack.last().is_some_and(|n| n.heading_level >= level) {
        if let Some(node) = stack.pop() {
            if let Some(parent) = stack.last_mut() {
                parent.children.push(node);
            }
        }
    }
}

/// Level and title of every heading in `text`, outside fenced code blocks.
pub(crate) fn headings(text: &str) -> Vec<(u8, String)> {
    let mut found = Vec::new();
    let mut fence: Option<Fence> = None;

    for line in text.lines() {
        match fence {
            Some(open) => {
                if open.closed_by(line) {
                    fence = None;
                }
            }
            None => {
                if let Some(open) = Fence::open(line) {
                    fence = Some(open);
                } else if let Some(heading) = parse_heading(line) {
                    found.push(heading);
                }
            }
        }
    }
    found
}

/// Level and title of an ATX heading line.
pub(crate) fn parse_heading(line: &str) -> Option<(u8, String)> {
    let indent = line.len() - line.trim_start_matches(' ').len();
    if indent > 3 {
        return None;
    }
    let rest = &line[indent..];
    let level = rest.chars().take_while(|c| *c == '#').count();
    if !(1..=6).contains(&level) {
        return None;
    }
    let after = &rest[level..];
    if !after.is_empty() && !after.starts_with([' ', '\t']) {
        return None;
    }

    // Optional closing sequence of '#'
    let title = after.trim();
    let title = match title.trim_end_matches('#') {
        stripped if stripped.is_empty() || stripped.ends_with([' ', '\t']) => stripped.trim_end(),
        _ => title,
    };

    Some((level as u8, title.to_string()))
}
