//! Token-bounded splitting of Markdown that contains pipe tables.
//!
//! Text is packed greedily, one unit at a time: a plain line, a whole fenced
//! code block, or a table row. Tables are never broken inside a row; when a
//! table continues in a new chunk its header and alignment row are repeated.
//! A row too large for any chunk is sliced by columns, each slice rendered as
//! a small table with the matching header cells.

use crate::protect::Fence;
use crate::tokenizer::Tokenizer;
use mdsplit_core::{AppError, AppResult};
use regex::Regex;
use std::sync::{Arc, LazyLock};

/// Smallest limit that can hold a table skeleton.
pub const MIN_TABLE_TOKEN_LIMIT: usize = 10;

static TABLE_SEP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\|?(?:\s*:?-+:?\s*\|)*\s*:?-+:?\s*\|?\s*$").expect("valid separator pattern")
});

/// Statistics of one `split` call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableSplitMetrics {
    pub chunk_count: usize,
    pub avg_tokens: f64,
    pub max_tokens: usize,
    pub min_tokens: usize,
    pub total_output_tokens: usize,
    pub total_output_chars: usize,
    pub input_table_count: usize,
}

#[derive(Debug)]
struct Table<'a> {
    header: &'a str,
    sep: &'a str,
    header_cells: Vec<String>,
    sep_cells: Vec<String>,
    rows: Vec<(&'a str, Vec<String>)>,
}

#[derive(Debug)]
enum Unit<'a> {
    Text(&'a str),
    Table(Table<'a>),
}

/// Splits Markdown into chunks of at most `token_limit` tokens, keeping rows whole.
#[derive(Debug, Clone)]
pub struct TableSplitter {
    tokenizer: Arc<dyn Tokenizer>,
    token_limit: usize,
}

impl TableSplitter {
    pub fn new(tokenizer: Arc<dyn Tokenizer>, token_limit: usize) -> AppResult<Self> {
        if token_limit < MIN_TABLE_TOKEN_LIMIT {
            return Err(AppError::Config(format!(
                "table splitter token limit must be at least {}, got {}",
                MIN_TABLE_TOKEN_LIMIT, token_limit
            )));
        }
        Ok(Self {
            tokenizer,
            token_limit,
        })
    }

    /// Split `text` into chunks.
    pub fn split(&self, text: &str) -> Vec<String> {
        let (chunks, metrics) = self.split_with_metrics(text);
        tracing::debug!(
            chunk_count = metrics.chunk_count,
            avg_tokens = metrics.avg_tokens,
            max_tokens = metrics.max_tokens,
            min_tokens = metrics.min_tokens,
            total_output_tokens = metrics.total_output_tokens,
            total_output_chars = metrics.total_output_chars,
            input_table_count = metrics.input_table_count,
            "Table split finished"
        );
        chunks
    }

    /// Split `text` and report statistics about the result.
    pub fn split_with_metrics(&self, text: &str) -> (Vec<String>, TableSplitMetrics) {
        let units = parse_units(text);
        let input_table_count = units
            .iter()
            .filter(|unit| matches!(unit, Unit::Table(_)))
            .count();

        let mut packer = Packer::new(self.token_limit);
        for unit in &units {
            match unit {
                Unit::Text(text) => {
                    packer.push(text, self.tokenizer.count(text));
                }
                Unit::Table(table) => self.pack_table(&mut packer, table),
            }
        }
        let chunks = packer.finish();

        let metrics = self.metrics(&chunks, input_table_count);
        (chunks, metrics)
    }

    fn pack_table(&self, packer: &mut Packer, table: &Table<'_>) {
        let header = format!("{}{}", with_newline(table.header), with_newline(table.sep));
        let header_tokens = self.tokenizer.count(&header);

        packer.push(&header, header_tokens);
        let mut rows_in_chunk = 0;
        let mut reseeded = false;

        for (line, cells) in &table.rows {
            let line = with_newline(line);
            let row_tokens = self.tokenizer.count(&line);

            if packer.fits(row_tokens) {
                packer.push_unchecked(&line, row_tokens);
                rows_in_chunk += 1;
                continue;
            }

            // Start a new chunk that holds only the header
            if packer.buffer.len() > header.len() {
                if rows_in_chunk == 0 {
                    packer.pop(header.len(), header_tokens);
                }
                packer.flush();
                packer.push(&header, header_tokens);
                rows_in_chunk = 0;
                reseeded = true;
            }

            if packer.fits(row_tokens) {
                packer.push_unchecked(&line, row_tokens);
                rows_in_chunk += 1;
                continue;
            }

            // The row cannot share a chunk with the header
            packer.pop(header.len(), header_tokens);
            packer.flush();
            tracing::debug!(
                "Row of {} tokens exceeds limit {}, slicing by columns",
                row_tokens,
                self.token_limit
            );
            for slice in self.column_slices(table, cells) {
                packer.emit(slice);
            }
            packer.push(&header, header_tokens);
            reseeded = true;
        }

        if reseeded && rows_in_chunk == 0 {
            packer.pop(header.len(), header_tokens);
        }
    }

    /// Render an oversized row as tables over consecutive column ranges.
    fn column_slices(&self, table: &Table<'_>, cells: &[String]) -> Vec<String> {
        let cost = |start: usize, end: usize| {
            self.tokenizer.count(&make_row(&table.header_cells[start..end]))
                + self.tokenizer.count(&make_row(&table.sep_cells[start..end]))
                + self.tokenizer.count(&make_row(&cells[start..end]))
        };

        let mut slices = Vec::new();
        let mut start = 0;
        while start < cells.len() {
            let mut end = start + 1;
            while end < cells.len() && cost(start, end + 1) <= self.token_limit {
                end += 1;
            }
            let slice = format!(
                "{}{}{}",
                make_row(&table.header_cells[start..end]),
                make_row(&table.sep_cells[start..end]),
                make_row(&cells[start..end])
            );
            // A single cell is never cut, even when it alone exceeds the limit
            if end == start + 1 && self.tokenizer.count(&slice) > self.token_limit {
                tracing::warn!(
                    "Column {} of a table row exceeds limit {}, kept whole",
                    start,
                    self.token_limit
                );
            }
            slices.push(slice);
            start = end;
        }
        slices
    }

    fn metrics(&self, chunks: &[String], input_table_count: usize) -> TableSplitMetrics {
        let tokens: Vec<usize> = chunks.iter().map(|c| self.tokenizer.count(c)).collect();
        let total_output_tokens: usize = tokens.iter().sum();
        TableSplitMetrics {
            chunk_count: chunks.len(),
            avg_tokens: if chunks.is_empty() {
                0.0
            } else {
                total_output_tokens as f64 / chunks.len() as f64
            },
            max_tokens: tokens.iter().copied().max().unwrap_or(0),
            min_tokens: tokens.iter().copied().min().unwrap_or(0),
            total_output_tokens,
            total_output_chars: chunks.iter().map(|c| c.chars().count()).sum(),
            input_table_count,
        }
    }
}

/// Greedy chunk accumulator.
struct Packer {
    limit: usize,
    buffer: String,
    tokens: usize,
    chunks: Vec<String>,
}

impl Packer {
    fn new(limit: usize) -> Self {
        Self {
            limit,
            buffer: String::new(),
            tokens: 0,
            chunks: Vec::new(),
        }
    }

    fn fits(&self, tokens: usize) -> bool {
        self.tokens + tokens <= self.limit
    }

    /// Append, flushing first when the text would overflow a non-empty buffer.
    fn push(&mut self, text: &str, tokens: usize) {
        if !self.fits(tokens) && !self.buffer.trim().is_empty() {
            self.flush();
        }
        self.push_unchecked(text, tokens);
    }

    fn push_unchecked(&mut self, text: &str, tokens: usize) {
        self.buffer.push_str(text);
        self.tokens += tokens;
    }

    /// Remove the last `len` bytes pushed.
    fn pop(&mut self, len: usize, tokens: usize) {
        self.buffer.truncate(self.buffer.len().saturating_sub(len));
        self.tokens = self.tokens.saturating_sub(tokens);
    }

    fn flush(&mut self) {
        let chunk = std::mem::take(&mut self.buffer);
        if !chunk.trim().is_empty() {
            self.chunks.push(chunk);
        }
        self.tokens = 0;
    }

    fn emit(&mut self, chunk: String) {
        self.chunks.push(chunk);
    }

    fn finish(mut self) -> Vec<String> {
        self.flush();
        self.chunks
    }
}

/// Re-render cells as a single table row.
fn make_row(cells: &[String]) -> String {
    format!("|{}|\n", cells.join(" | "))
}

fn with_newline(line: &str) -> String {
    if line.ends_with('\n') {
        line.to_string()
    } else {
        format!("{}\n", line)
    }
}

/// Cells of a table line, split on unescaped pipes.
fn split_cells(line: &str) -> Vec<String> {
    let trimmed = line.trim();
    let trimmed = trimmed.strip_prefix('|').unwrap_or(trimmed);
    let trimmed = match trimmed.strip_suffix('|') {
        Some(rest) if !rest.ends_with('\\') => rest,
        _ => trimmed,
    };

    let mut cells = Vec::new();
    let mut current = String::new();
    let mut escaped = false;
    for c in trimmed.chars() {
        match c {
            '|' if !escaped => cells.push(std::mem::take(&mut current).trim().to_string()),
            _ => current.push(c),
        }
        escaped = c == '\\' && !escaped;
    }
    cells.push(current.trim().to_string());
    cells
}

fn is_separator(line: &str) -> bool {
    line.contains('|') && TABLE_SEP_RE.is_match(line.trim_end_matches(['\n', '\r']))
}

/// Whether `text` contains a well-formed pipe table outside code blocks.
pub(crate) fn contains_table(text: &str) -> bool {
    parse_units(text)
        .iter()
        .any(|unit| matches!(unit, Unit::Table(_)))
}

/// Group lines into plain text, fenced blocks and tables.
fn parse_units(text: &str) -> Vec<Unit<'_>> {
    let lines: Vec<&str> = text.split_inclusive('\n').collect();
    let offsets: Vec<usize> = lines
        .iter()
        .scan(0, |offset, line| {
            let start = *offset;
            *offset += line.len();
            Some(start)
        })
        .collect();

    let mut units = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];

        if let Some(fence) = Fence::open(line.trim_end_matches(['\n', '\r'])) {
            let mut end = i + 1;
            while end < lines.len() {
                let closes = fence.closed_by(lines[end].trim_end_matches(['\n', '\r']));
                end += 1;
                if closes {
                    break;
                }
            }
            let stop = offsets.get(end).copied().unwrap_or(text.len());
            units.push(Unit::Text(&text[offsets[i]..stop]));
            i = end;
            continue;
        }

        if line.contains('|') && i + 1 < lines.len() && is_separator(lines[i + 1]) {
            let mut end = i + 2;
            while end < lines.len() && lines[end].contains('|') && !lines[end].trim().is_empty() {
                end += 1;
            }

            let table = Table {
                header: line,
                sep: lines[i + 1],
                header_cells: split_cells(line),
                sep_cells: split_cells(lines[i + 1]),
                rows: lines[i + 2..end]
                    .iter()
                    .map(|row| (*row, split_cells(row)))
                    .collect(),
            };

            let width = table.header_cells.len();
            let consistent = table.sep_cells.len() == width
                && table.rows.iter().all(|(_, cells)| cells.len() == width);
            if consistent {
                units.push(Unit::Table(table));
            } else {
                tracing::warn!(
                    "Malformed table at line {}: inconsistent cell counts, treating as text",
                    i + 1
                );
                units.extend(lines[i..end].iter().copied().map(Unit::Text));
            }
            i = end;
            continue;
        }

        units.push(Unit::Text(line));
        i += 1;
    }
    units
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::TiktokenTokenizer;

    fn tokenizer() -> Arc<dyn Tokenizer> {
        Arc::new(TiktokenTokenizer::cl100k().unwrap())
    }

    fn table(rows: usize) -> String {
        let mut text = String::from("| Name | City | Score |\n| --- | :---: | ---: |\n");
        for i in 0..rows {
            text.push_str(&format!("| person{} | town{} | {} |\n", i, i, i * 7));
        }
        text
    }

    #[test]
    fn test_rejects_tiny_limit() {
        let result = TableSplitter::new(tokenizer(), 9);
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_short_table_unsplit() {
        let splitter = TableSplitter::new(tokenizer(), 500).unwrap();
        let text = format!("Intro line\n\n{}", table(3));
        let chunks = splitter.split(&text);
        assert_eq!(chunks, vec![text]);
    }

    #[test]
    fn test_long_table_repeats_header() {
        let splitter = TableSplitter::new(tokenizer(), 60).unwrap();
        let text = table(30);
        let (chunks, metrics) = splitter.split_with_metrics(&text);

        assert!(chunks.len() > 1);
        assert_eq!(metrics.chunk_count, chunks.len());
        assert_eq!(metrics.input_table_count, 1);

        let mut rows = Vec::new();
        for chunk in &chunks {
            let lines: Vec<&str> = chunk.lines().collect();
            assert_eq!(lines[0], "| Name | City | Score |");
            assert_eq!(lines[1], "| --- | :---: | ---: |");
            assert!(lines.len() > 2, "chunk without rows: {chunk:?}");
            rows.extend(lines[2..].iter().map(|l| l.to_string()));
        }

        // Every row appears exactly once, in order
        let expected: Vec<String> = text.lines().skip(2).map(str::to_string).collect();
        assert_eq!(rows, expected);
    }

    #[test]
    fn test_oversized_row_column_slices() {
        let splitter = TableSplitter::new(tokenizer(), 40).unwrap();
        let long_cell = "word ".repeat(20);
        let text = format!(
            "| A | B | C |\n|---|---|---|\n| short | row | here |\n| {} | {} | {} |\n| tail | row | end |\n",
            long_cell.trim(),
            long_cell.trim(),
            long_cell.trim()
        );

        let chunks = splitter.split(&text);
        assert!(chunks.len() >= 4, "{chunks:#?}");

        // Normal rows keep the full header
        assert!(chunks[0].starts_with("| A | B | C |\n|---|---|---|\n| short"));
        assert!(chunks.last().unwrap().contains("| tail | row | end |"));

        // Slices carry their own header subset and cover each column once
        let slices: Vec<&String> = chunks.iter().filter(|c| c.contains("word")).collect();
        assert_eq!(slices.len(), 3);
        assert!(slices[0].starts_with("|A|\n|---|\n"));
        assert!(slices[1].starts_with("|B|\n"));
        assert!(slices[2].starts_with("|C|\n"));
    }

    #[test]
    fn test_oversized_single_cell_kept_whole() {
        let tokenizer = tokenizer();
        let splitter = TableSplitter::new(tokenizer.clone(), 40).unwrap();
        let long_cell = "word ".repeat(60);
        let text = format!(
            "| Notes |\n|---|\n| first |\n| {} |\n| last |\n",
            long_cell.trim()
        );

        let chunks = splitter.split(&text);
        let oversized: Vec<&String> = chunks.iter().filter(|c| c.contains("word word")).collect();
        assert_eq!(oversized.len(), 1);
        assert_eq!(
            oversized[0].as_str(),
            format!("|Notes|\n|---|\n|{}|\n", long_cell.trim())
        );
        assert!(tokenizer.count(oversized[0]) > 40);

        // Every other chunk still fits
        for chunk in chunks.iter().filter(|c| !c.contains("word word")) {
            assert!(tokenizer.count(chunk) <= 40, "{chunk}");
        }
    }

    #[test]
    fn test_padded_rows_counted_as_written() {
        let tokenizer = tokenizer();
        let splitter = TableSplitter::new(tokenizer.clone(), 40).unwrap();
        let mut text = format!("| {:<40} | {:<40} |\n|{:-<42}|{:-<42}|\n", "Key", "Value", "", "");
        for i in 0..12 {
            text.push_str(&format!("| {:<40} | {:<40} |\n", format!("k{}", i), format!("v{}", i)));
        }

        let chunks = splitter.split(&text);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(tokenizer.count(chunk) <= 40, "{} tokens: {chunk:?}", tokenizer.count(chunk));
            assert!(chunk.starts_with("| Key "));
        }
    }

    #[test]
    fn test_text_lines_are_packed() {
        let splitter = TableSplitter::new(tokenizer(), 12).unwrap();
        let text = "one two three four\nfive six seven eight\nnine ten eleven twelve\n";
        let chunks = splitter.split(text);
        assert!(chunks.len() >= 2);
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_fenced_block_is_one_unit() {
        let splitter = TableSplitter::new(tokenizer(), 10).unwrap();
        let text = "```\n| a | b |\n|---|---|\n| 1 | 2 |\n```\nafter\n";
        let (chunks, metrics) = splitter.split_with_metrics(text);
        assert_eq!(metrics.input_table_count, 0);
        assert_eq!(chunks[0], "```\n| a | b |\n|---|---|\n| 1 | 2 |\n```\n");
    }

    #[test]
    fn test_malformed_table_is_text() {
        let text = "| a | b |\n|---|---|\n| 1 | 2 | 3 |\n";
        assert!(!contains_table(text));
        let splitter = TableSplitter::new(tokenizer(), 100).unwrap();
        assert_eq!(splitter.split(text), vec![text.to_string()]);
    }

    #[test]
    fn test_split_cells() {
        assert_eq!(split_cells("| a | b \\| c | d |\n"), vec!["a", "b \\| c", "d"]);
        assert_eq!(split_cells("x | y"), vec!["x", "y"]);
    }

    #[test]
    fn test_separator_detection() {
        assert!(is_separator("| --- | :---: |\n"));
        assert!(is_separator("---|---"));
        assert!(!is_separator("---\n"));
        assert!(!is_separator("| a | b |"));
    }
}
