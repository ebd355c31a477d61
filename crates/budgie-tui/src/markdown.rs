// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use budgie_app::markup::{Block as MarkupBlock, Document, Inline, TableRow, inline_text};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

const BULLET: &str = "  • ";
const COLUMN_GAP: &str = " │ ";
const RULE_WIDTH: usize = 24;

/// Styled terminal lines for a parsed response.
pub fn document_lines(document: &Document) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for block in &document.blocks {
        match block {
            MarkupBlock::Heading { level, inlines } => {
                lines.push(Line::from(inline_spans(inlines, heading_style(*level))));
            }
            MarkupBlock::Paragraph(inlines) => {
                lines.push(Line::from(inline_spans(inlines, Style::default())));
            }
            MarkupBlock::List(items) => {
                for item in items {
                    let mut spans = vec![Span::styled(BULLET, Style::default().fg(Color::Cyan))];
                    spans.extend(inline_spans(item, Style::default()));
                    lines.push(Line::from(spans));
                }
            }
            MarkupBlock::Table { header, body } => table_lines(header, body, &mut lines),
            MarkupBlock::CodeBlock(code) => {
                let style = Style::default().fg(Color::Yellow);
                for line in code {
                    lines.push(Line::from(Span::styled(format!("  {line}"), style)));
                }
            }
            MarkupBlock::Rule => lines.push(Line::from(Span::styled(
                "─".repeat(RULE_WIDTH),
                Style::default().fg(Color::DarkGray),
            ))),
            MarkupBlock::Blank => lines.push(Line::default()),
        }
    }
    lines
}

pub fn text_lines(text: &str) -> Vec<Line<'static>> {
    document_lines(&Document::parse(text))
}

fn heading_style(level: u8) -> Style {
    let color = match level {
        1 => Color::Magenta,
        2 => Color::Cyan,
        _ => Color::Blue,
    };
    let style = Style::default().fg(color).add_modifier(Modifier::BOLD);
    if level == 1 {
        style.add_modifier(Modifier::UNDERLINED)
    } else {
        style
    }
}

fn inline_spans(inlines: &[Inline], base: Style) -> Vec<Span<'static>> {
    inlines
        .iter()
        .map(|inline| match inline {
            Inline::Text(text) => Span::styled(text.clone(), base),
            Inline::Bold(text) => Span::styled(text.clone(), base.add_modifier(Modifier::BOLD)),
            Inline::Italic(text) => {
                Span::styled(text.clone(), base.add_modifier(Modifier::ITALIC))
            }
            Inline::Code(text) => Span::styled(text.clone(), base.fg(Color::Yellow)),
        })
        .collect()
}

fn table_lines(header: &[TableRow], body: &[TableRow], lines: &mut Vec<Line<'static>>) {
    let columns = header
        .iter()
        .chain(body)
        .map(|row| row.len())
        .max()
        .unwrap_or(0);
    if columns == 0 {
        return;
    }

    let mut widths = vec![0usize; columns];
    for row in header.iter().chain(body) {
        for (index, cell) in row.iter().enumerate() {
            widths[index] = widths[index].max(inline_text(cell).chars().count());
        }
    }

    let header_style = Style::default().add_modifier(Modifier::BOLD);
    for row in header {
        lines.push(table_row_line(row, &widths, header_style));
    }
    if !header.is_empty() {
        let rule_width = widths.iter().sum::<usize>() + COLUMN_GAP.chars().count() * (columns - 1);
        lines.push(Line::from(Span::styled(
            "─".repeat(rule_width),
            Style::default().fg(Color::DarkGray),
        )));
    }
    for row in body {
        lines.push(table_row_line(row, &widths, Style::default()));
    }
}

fn table_row_line(row: &TableRow, widths: &[usize], base: Style) -> Line<'static> {
    let mut spans = Vec::new();
    for (index, width) in widths.iter().enumerate() {
        if index > 0 {
            spans.push(Span::styled(COLUMN_GAP, Style::default().fg(Color::DarkGray)));
        }
        let cell = row.get(index).map(Vec::as_slice).unwrap_or(&[]);
        let used = inline_text(cell).chars().count();
        spans.extend(inline_spans(cell, base));
        if used < *width {
            spans.push(Span::raw(" ".repeat(width - used)));
        }
    }
    Line::from(spans)
}
