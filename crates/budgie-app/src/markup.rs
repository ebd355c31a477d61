// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Folds the CommonMark event stream (tables enabled) for a model reply into
//! a small block tree the terminal can draw: headings, flat lists, tables,
//! rules, code blocks and paragraphs of styled spans. Parsing never fails;
//! anything the tree has no shape for degrades to plain text.

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use std::ops::Range;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    Bold(String),
    Italic(String),
    Code(String),
}

impl Inline {
    pub fn text(&self) -> &str {
        match self {
            Self::Text(text) | Self::Bold(text) | Self::Italic(text) | Self::Code(text) => text,
        }
    }
}

pub type Cell = Vec<Inline>;
pub type TableRow = Vec<Cell>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// Levels past 3 are clamped to 3.
    Heading { level: u8, inlines: Vec<Inline> },
    Paragraph(Vec<Inline>),
    /// Nested lists are flattened; ordered items carry their `N. ` prefix.
    List(Vec<Vec<Inline>>),
    Table { header: Vec<TableRow>, body: Vec<TableRow> },
    CodeBlock(Vec<String>),
    Rule,
    /// One or more blank source lines between two blocks.
    Blank,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Document {
    pub blocks: Vec<Block>,
}

impl Document {
    pub fn parse(text: &str) -> Self {
        let mut builder = Builder::new(text);
        for (event, range) in Parser::new_ext(text, Options::ENABLE_TABLES).into_offset_iter() {
            builder.feed(event, range);
        }
        Self {
            blocks: builder.blocks,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.iter().all(|block| matches!(block, Block::Blank))
    }

    /// Text with all markup stripped, one output line per rendered line.
    pub fn plain_text(&self) -> String {
        let mut lines = Vec::new();
        for block in &self.blocks {
            match block {
                Block::Heading { inlines, .. } | Block::Paragraph(inlines) => {
                    lines.push(inline_text(inlines));
                }
                Block::List(items) => {
                    for item in items {
                        lines.push(format!("- {}", inline_text(item)));
                    }
                }
                Block::Table { header, body } => {
                    for row in header.iter().chain(body) {
                        let cells = row.iter().map(|cell| inline_text(cell)).collect::<Vec<_>>();
                        lines.push(cells.join(" | "));
                    }
                }
                Block::CodeBlock(code) => lines.extend(code.iter().cloned()),
                Block::Rule => lines.push("---".to_owned()),
                Block::Blank => lines.push(String::new()),
            }
        }
        lines.join("\n")
    }
}

pub fn inline_text(inlines: &[Inline]) -> String {
    inlines.iter().map(Inline::text).collect()
}

#[derive(Default)]
struct TableBuilder {
    in_head: bool,
    header: Vec<TableRow>,
    body: Vec<TableRow>,
    row: TableRow,
}

struct Builder<'a> {
    source: &'a str,
    blocks: Vec<Block>,
    inlines: Vec<Inline>,
    depth: usize,
    last_line: Option<usize>,
    strong: usize,
    emphasis: usize,
    heading: Option<u8>,
    list_items: Vec<Vec<Inline>>,
    ordinals: Vec<Option<u64>>,
    table: Option<TableBuilder>,
    code: Option<String>,
}

impl<'a> Builder<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            blocks: Vec::new(),
            inlines: Vec::new(),
            depth: 0,
            last_line: None,
            strong: 0,
            emphasis: 0,
            heading: None,
            list_items: Vec::new(),
            ordinals: Vec::new(),
            table: None,
            code: None,
        }
    }

    fn feed(&mut self, event: Event<'_>, range: Range<usize>) {
        match event {
            Event::Start(tag) => {
                if self.depth == 0 {
                    self.begin_block(range.start);
                }
                self.depth += 1;
                self.start(tag);
            }
            Event::End(tag) => {
                self.end(tag);
                self.depth = self.depth.saturating_sub(1);
                if self.depth == 0 {
                    self.end_block(range.end);
                }
            }
            Event::Text(text) => match self.code.as_mut() {
                Some(code) => code.push_str(&text),
                None => self.push_text(&text),
            },
            Event::Code(code) => self.inlines.push(Inline::Code(code.into_string())),
            Event::InlineHtml(html) => self.push_text(&html),
            Event::Html(html) => {
                self.push_text(html.trim_end());
                self.flush_paragraph();
            }
            Event::SoftBreak | Event::HardBreak => {
                if self.in_plain_paragraph() {
                    self.flush_paragraph();
                } else {
                    self.push_text(" ");
                }
            }
            Event::Rule => {
                if self.depth == 0 {
                    self.begin_block(range.start);
                }
                self.blocks.push(Block::Rule);
                if self.depth == 0 {
                    self.end_block(range.end);
                }
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { level, .. } => {
                self.heading = Some(match level {
                    HeadingLevel::H1 => 1,
                    HeadingLevel::H2 => 2,
                    _ => 3,
                });
            }
            Tag::Paragraph => {
                if !self.ordinals.is_empty()
                    && self
                        .inlines
                        .last()
                        .is_some_and(|inline| !inline.text().ends_with(' '))
                {
                    self.push_text(" ");
                }
            }
            Tag::List(first) => {
                self.flush_item();
                self.ordinals.push(first);
            }
            Tag::Item => {
                if let Some(Some(next)) = self.ordinals.last_mut() {
                    let ordinal = *next;
                    *next = next.saturating_add(1);
                    self.push_text(&format!("{ordinal}. "));
                }
            }
            Tag::Table(_) => {
                self.flush_paragraph();
                self.table = Some(TableBuilder::default());
            }
            Tag::TableHead => {
                if let Some(table) = self.table.as_mut() {
                    table.in_head = true;
                }
            }
            Tag::CodeBlock(_) => {
                self.flush_paragraph();
                self.code = Some(String::new());
            }
            Tag::Strong => self.strong += 1,
            Tag::Emphasis => self.emphasis += 1,
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Heading(_) => {
                let level = self.heading.take().unwrap_or(3);
                let inlines = self.take_inlines();
                self.blocks.push(Block::Heading { level, inlines });
            }
            TagEnd::Paragraph => {
                if self.ordinals.is_empty() {
                    self.flush_paragraph();
                }
            }
            TagEnd::Item => self.flush_item(),
            TagEnd::List(_) => {
                self.flush_item();
                self.ordinals.pop();
                if self.ordinals.is_empty() && !self.list_items.is_empty() {
                    let items = std::mem::take(&mut self.list_items);
                    self.blocks.push(Block::List(items));
                }
            }
            TagEnd::TableCell => {
                let cell = self.take_inlines();
                if let Some(table) = self.table.as_mut() {
                    table.row.push(cell);
                }
            }
            TagEnd::TableHead => {
                if let Some(table) = self.table.as_mut() {
                    let row = std::mem::take(&mut table.row);
                    table.header.push(row);
                    table.in_head = false;
                }
            }
            TagEnd::TableRow => {
                if let Some(table) = self.table.as_mut() {
                    let row = std::mem::take(&mut table.row);
                    if table.in_head {
                        table.header.push(row);
                    } else {
                        table.body.push(row);
                    }
                }
            }
            TagEnd::Table => {
                if let Some(table) = self.table.take() {
                    self.blocks.push(Block::Table {
                        header: table.header,
                        body: table.body,
                    });
                }
            }
            TagEnd::CodeBlock => {
                if let Some(code) = self.code.take() {
                    self.blocks
                        .push(Block::CodeBlock(code.lines().map(str::to_owned).collect()));
                }
            }
            TagEnd::HtmlBlock => self.flush_paragraph(),
            TagEnd::Strong => self.strong = self.strong.saturating_sub(1),
            TagEnd::Emphasis => self.emphasis = self.emphasis.saturating_sub(1),
            _ => {}
        }
    }

    fn in_plain_paragraph(&self) -> bool {
        self.ordinals.is_empty() && self.table.is_none() && self.heading.is_none()
    }

    /// Adjacent spans of one style merge, so literal `*` runs that open no
    /// emphasis read back as a single text span.
    fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let inline = if self.strong > 0 {
            Inline::Bold(text.to_owned())
        } else if self.emphasis > 0 {
            Inline::Italic(text.to_owned())
        } else {
            Inline::Text(text.to_owned())
        };
        match (self.inlines.last_mut(), inline) {
            (Some(Inline::Text(last)), Inline::Text(next))
            | (Some(Inline::Bold(last)), Inline::Bold(next))
            | (Some(Inline::Italic(last)), Inline::Italic(next)) => last.push_str(&next),
            (_, inline) => self.inlines.push(inline),
        }
    }

    fn take_inlines(&mut self) -> Vec<Inline> {
        let mut inlines = std::mem::take(&mut self.inlines);
        if let Some(Inline::Text(last)) = inlines.last_mut() {
            let trimmed = last.trim_end().len();
            last.truncate(trimmed);
            if last.is_empty() {
                inlines.pop();
            }
        }
        inlines
    }

    fn flush_paragraph(&mut self) {
        let inlines = self.take_inlines();
        if !inlines.is_empty() {
            self.blocks.push(Block::Paragraph(inlines));
        }
    }

    fn flush_item(&mut self) {
        let inlines = self.take_inlines();
        if !inlines.is_empty() {
            self.list_items.push(inlines);
        }
    }

    fn begin_block(&mut self, start: usize) {
        let line = self.source[..start].matches('\n').count();
        if let Some(last) = self.last_line
            && line > last + 1
        {
            self.blocks.push(Block::Blank);
        }
    }

    fn end_block(&mut self, end: usize) {
        self.last_line = Some(self.source[..end].trim_end().matches('\n').count());
    }
}
