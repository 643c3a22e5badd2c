//! Chunking orchestrator.
//!
//! A document is parsed into a heading tree, fitted into the token budget
//! section by section, and emitted as ordered chunks with metadata.

use super::{
    breadcrumbs::add_breadcrumbs,
    fallback::Fallback,
    merging::{drop_undersized, merge_undersized},
    tree::{parse_heading, DocumentNode},
};
use crate::cutter::ChunkCutter;
use crate::metadata::{build_chunks, calculate_hash};
use crate::models::ModelStore;
use crate::protect::{enclosing_span, is_fenced_block, protected_spans};
use crate::sentence::{SentenceSplitter, SentenceSplitterRegistry};
use crate::table::{contains_table, TableSplitter, MIN_TABLE_TOKEN_LIMIT};
use crate::tokenizer::{self, Tokenizer};
use crate::types::{Chunk, Document, SplitReport, TruncationEvent};
use mdsplit_core::{AppError, AppResult, SplitterSettings};
use std::sync::Arc;

/// Token limits for chunking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkConfig {
    /// Nominal maximum tokens per chunk
    pub token_limit: usize,

    /// Tolerance above `token_limit` before a span counts as oversized
    pub token_limit_buffer: usize,

    /// Pieces below this are merged into a neighbour
    pub token_limit_min: usize,

    /// Drop the text after a cut instead of chunking it
    pub discard_cut_remainder: bool,

    /// Prefix chunks with their ancestor headings and drop heading-only chunks
    pub heading_breadcrumbs: bool,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            token_limit: 1024,
            token_limit_buffer: 32,
            token_limit_min: 64,
            discard_cut_remainder: false,
            heading_breadcrumbs: true,
        }
    }
}

impl ChunkConfig {
    pub fn from_settings(settings: &SplitterSettings) -> Self {
        Self {
            token_limit: settings.token_count_max,
            token_limit_buffer: settings.token_count_buffer,
            token_limit_min: settings.token_count_min,
            discard_cut_remainder: settings.discard_cut_remainder,
            heading_breadcrumbs: settings.heading_breadcrumbs,
        }
    }

    /// Largest token count a chunk may have without fallback.
    pub fn budget(&self) -> usize {
        self.token_limit + self.token_limit_buffer
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.token_limit < MIN_TABLE_TOKEN_LIMIT {
            return Err(AppError::Config(format!(
                "token_limit must be at least {}, got {}",
                MIN_TABLE_TOKEN_LIMIT, self.token_limit
            )));
        }
        if self.token_limit_min == 0 {
            return Err(AppError::Config(
                "token_limit_min must be greater than 0".to_string(),
            ));
        }
        if self.token_limit_min > self.token_limit {
            return Err(AppError::Config(format!(
                "token_limit_min ({}) must not exceed token_limit ({})",
                self.token_limit_min, self.token_limit
            )));
        }
        Ok(())
    }
}

/// Per-document state collected while splitting.
struct SplitContext {
    source_hash: String,
    truncations: Vec<TruncationEvent>,
}

/// Structure-aware Markdown splitter.
#[derive(Debug, Clone)]
pub struct SemanticSplitter {
    config: ChunkConfig,
    tokenizer: Arc<dyn Tokenizer>,
    sentence_splitter: Arc<dyn SentenceSplitter>,
    table_splitter: TableSplitter,
    cutter: ChunkCutter,
}

impl SemanticSplitter {
    /// Create a splitter from a validated configuration and providers.
    pub fn new(
        config: ChunkConfig,
        tokenizer: Arc<dyn Tokenizer>,
        sentence_splitter: Arc<dyn SentenceSplitter>,
    ) -> AppResult<Self> {
        config.validate()?;

        let table_splitter = TableSplitter::new(tokenizer.clone(), config.token_limit)?;
        let cutter = ChunkCutter::new(tokenizer.clone());

        tracing::debug!(
            "Semantic splitter ready: limit={}, buffer={}, min={}, tokenizer={}, sentences={}",
            config.token_limit,
            config.token_limit_buffer,
            config.token_limit_min,
            tokenizer.name(),
            sentence_splitter.name()
        );

        Ok(Self {
            config,
            tokenizer,
            sentence_splitter,
            table_splitter,
            cutter,
        })
    }

    /// Resolve providers by name and build a splitter.
    pub fn from_settings(settings: &SplitterSettings, store: &ModelStore) -> AppResult<Self> {
        settings.validate()?;

        let tokenizer = tokenizer::from_name(&settings.tokenizer_model, store)?;
        let sentence_splitter = SentenceSplitterRegistry::new()
            .with_abbreviations(
                settings.abbreviations.clone(),
                settings.extra_abbreviations.clone(),
            )
            .from_name(&settings.sentence_splitter_model, store)?;

        Self::new(ChunkConfig::from_settings(settings), tokenizer, sentence_splitter)
    }

    pub fn config(&self) -> &ChunkConfig {
        &self.config
    }

    pub fn tokenizer(&self) -> &Arc<dyn Tokenizer> {
        &self.tokenizer
    }

    pub fn sentence_splitter(&self) -> &Arc<dyn SentenceSplitter> {
        &self.sentence_splitter
    }

    /// Split a document into chunks.
    pub fn split(&self, document: &Document) -> Vec<Chunk> {
        self.split_with_report(document).chunks
    }

    /// Split several documents; chunks keep document order.
    pub fn split_documents(&self, documents: &[Document]) -> Vec<Chunk> {
        documents.iter().flat_map(|doc| self.split(doc)).collect()
    }

    /// Split a document and report every truncation made.
    pub fn split_with_report(&self, document: &Document) -> SplitReport {
        let mut ctx = SplitContext {
            source_hash: calculate_hash(&document.text),
            truncations: Vec::new(),
        };

        if document.text.trim().is_empty() {
            tracing::debug!("Empty document {:?}, no chunks", document.url);
            return SplitReport::default();
        }

        let root = DocumentNode::parse(&document.text);
        let pieces = self.fit_node(&root, &mut ctx);
        let pieces = merge_undersized(
            pieces,
            self.config.token_limit_min,
            self.config.budget(),
            self.tokenizer.as_ref(),
        );
        let pieces = drop_undersized(pieces, self.config.token_limit_min, self.tokenizer.as_ref());
        let pieces = if self.config.heading_breadcrumbs {
            add_breadcrumbs(pieces, self.config.budget(), self.tokenizer.as_ref())
        } else {
            pieces
        };

        let chunks = build_chunks(document, &ctx.source_hash, pieces, self.tokenizer.as_ref());

        tracing::info!(
            "Chunking complete: {} chunks from {} bytes ({} truncations) for {:?}",
            chunks.len(),
            document.text.len(),
            ctx.truncations.len(),
            document.url
        );

        SplitReport {
            chunks,
            truncations: ctx.truncations,
        }
    }

    fn fits(&self, text: &str) -> bool {
        self.tokenizer.count(text) <= self.config.budget()
    }

    /// Pieces for a node: the whole subtree if it fits, else its own section
    /// through the fallbacks followed by its children.
    fn fit_node(&self, node: &DocumentNode, ctx: &mut SplitContext) -> Vec<String> {
        let text = node.text();
        if text.trim().is_empty() {
            return Vec::new();
        }
        if self.fits(&text) {
            return vec![text];
        }

        let mut pieces = self.fit_span(&node.section(), Fallback::FIRST, ctx);
        for child in &node.children {
            pieces.extend(self.fit_node(child, ctx));
        }

        merge_undersized(
            pieces,
            self.config.token_limit_min,
            self.config.budget(),
            self.tokenizer.as_ref(),
        )
    }

    /// Fit a span starting at `stage`; oversized results continue down the chain.
    fn fit_span(&self, span: &str, stage: Fallback, ctx: &mut SplitContext) -> Vec<String> {
        if span.trim().is_empty() {
            return Vec::new();
        }
        if self.fits(span) {
            return vec![span.to_string()];
        }

        let Some(pieces) = self.try_fit(stage, span, ctx) else {
            return match stage.next() {
                Some(next) => self.fit_span(span, next, ctx),
                None => vec![span.to_string()],
            };
        };

        let mut fitted = Vec::with_capacity(pieces.len());
        for piece in pieces {
            if self.fits(&piece) {
                fitted.push(piece);
                continue;
            }
            match stage.next() {
                // Table rows are never cut
                Some(_) if stage == Fallback::Table && contains_table(&piece) => {
                    tracing::warn!(
                        "Keeping oversized table piece of {} tokens intact",
                        self.tokenizer.count(&piece)
                    );
                    fitted.push(piece);
                }
                Some(next) => fitted.extend(self.fit_span(&piece, next, ctx)),
                None => fitted.push(piece),
            }
        }
        fitted
    }

    /// Apply one fallback stage; `None` when it does not apply to the span.
    fn try_fit(&self, stage: Fallback, span: &str, ctx: &mut SplitContext) -> Option<Vec<String>> {
        match stage {
            Fallback::Table => Some(self.table_splitter.split(span)),
            Fallback::Sentences => self.pack_sentences(span),
            Fallback::Cut => Some(self.cut(span, ctx)),
        }
    }

    /// Greedily pack sentences into pieces of at most `token_limit` tokens.
    ///
    /// A leading heading line is kept out of the sentences and prepended to
    /// the first piece when it fits.
    fn pack_sentences(&self, span: &str) -> Option<Vec<String>> {
        if is_fenced_block(span) {
            return None;
        }

        let (heading, body) = split_heading_line(span);
        let sentences = rejoin_protected(self.sentence_splitter.get_sentences(body));
        if heading.is_none() && sentences.len() <= 1 {
            return None;
        }

        let mut pieces = Vec::new();
        let mut current = String::new();
        for sentence in sentences {
            if current.is_empty() {
                current = sentence;
                continue;
            }
            let candidate = format!("{} {}", current, sentence);
            if self.tokenizer.count(&candidate) <= self.config.token_limit {
                current = candidate;
            } else {
                pieces.push(std::mem::replace(&mut current, sentence));
            }
        }
        if !current.is_empty() {
            pieces.push(current);
        }

        if let Some(heading) = heading {
            match pieces.first_mut() {
                Some(first)
                    if self.tokenizer.count(&format!("{}\n\n{}", heading, first))
                        <= self.config.token_limit =>
                {
                    *first = format!("{}\n\n{}", heading, first);
                }
                _ => pieces.insert(0, heading.to_string()),
            }
        }
        Some(pieces)
    }

    /// Cut a span to `token_limit`, then the remainder, until everything fits.
    fn cut(&self, span: &str, ctx: &mut SplitContext) -> Vec<String> {
        let mut pieces = Vec::new();
        let mut rest = span.trim().to_string();

        while !rest.is_empty() {
            let cut = self.cutter.cut(&rest, self.config.token_limit);
            if !cut.is_truncated() {
                pieces.push(cut.kept);
                break;
            }

            tracing::warn!(
                "Truncated span to {} tokens at byte {}, {} bytes {}",
                cut.kept_tokens,
                cut.cut_at,
                cut.discarded.len(),
                if self.config.discard_cut_remainder {
                    "discarded"
                } else {
                    "carried over"
                }
            );
            ctx.truncations.push(TruncationEvent {
                source_hash: ctx.source_hash.clone(),
                span: rest.clone(),
                cut_at: cut.cut_at,
                kept_tokens: cut.kept_tokens,
                discarded: cut.discarded.clone(),
            });

            pieces.push(cut.kept);
            if self.config.discard_cut_remainder {
                break;
            }
            rest = cut.discarded.trim().to_string();
            if self.fits(&rest) {
                if !rest.is_empty() {
                    pieces.push(rest);
                }
                break;
            }
        }

        pieces
    }
}

/// Separate a leading ATX heading line from the rest of a span.
fn split_heading_line(span: &str) -> (Option<&str>, &str) {
    let trimmed = span.trim_start();
    let (first, rest) = trimmed.split_once('\n').unwrap_or((trimmed, ""));
    match parse_heading(first) {
        Some(_) => (Some(first.trim_end()), rest),
        None => (None, span),
    }
}

/// Merge sentences whose boundary falls inside a link, URL or code span.
fn rejoin_protected(sentences: Vec<String>) -> Vec<String> {
    let joined = sentences.join(" ");
    let spans = protected_spans(&joined);
    if spans.is_empty() {
        return sentences;
    }

    let mut merged: Vec<String> = Vec::with_capacity(sentences.len());
    let mut offset = 0;
    for sentence in sentences {
        let start = offset;
        offset += sentence.len() + 1;
        match merged.last_mut() {
            Some(last) if enclosing_span(&spans, start - 1).is_some() => {
                last.push(' ');
                last.push_str(&sentence);
            }
            _ => merged.push(sentence),
        }
    }
    merged
}
