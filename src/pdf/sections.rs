use crate::fonts::{FontId, TextMeasure};
use crate::model::{Analysis, ReportRequest};
use crate::style::ReportStyle;

use super::Composer;
use super::layout::{justify_words, wrap_text};

/// Full-width band across the top of page 1 with the title and timestamp.
pub(super) fn render_cover(c: &mut Composer, timestamp: &str) {
    let style = c.style;
    let band_bottom = style.page_height - style.cover_height;
    c.rect_at(0.0, band_bottom, style.page_width, style.cover_height, style.primary);

    let title_x = c.centered_x(&style.title, style.title_size, FontId::Bold);
    c.text_at(
        style.title.as_str(),
        title_x,
        band_bottom + 30.0,
        style.title_size,
        FontId::Bold,
        style.cover_text,
    );
    let ts_x = c.centered_x(timestamp, style.timestamp_size, FontId::Regular);
    c.text_at(
        timestamp,
        ts_x,
        band_bottom + 10.0,
        style.timestamp_size,
        FontId::Regular,
        style.cover_text,
    );

    c.cursor.set_y(band_bottom - 20.0);
    let y = c.cursor.y();
    c.line_at((style.margin, y), (style.page_width - style.margin, y), 2.0, style.primary);
    c.cursor.advance(20.0);
}

fn scan_lines(request: &ReportRequest) -> Vec<String> {
    let Some(scan) = &request.scan else {
        return Vec::new();
    };
    let devices = scan.total_devices.map(|n| n.to_string()).unwrap_or_default();
    [
        ("Scan ID", scan.id.as_str()),
        ("Type", scan.scan_type.as_str()),
        ("Status", scan.status.as_str()),
        ("Started", scan.started_at.as_str()),
        ("Devices Scanned", devices.as_str()),
    ]
    .into_iter()
    .filter(|(_, value)| !value.is_empty())
    .map(|(label, value)| format!("{label}: {value}"))
    .collect()
}

/// Shaded card with device fields on the left and scan fields on the right.
pub(super) fn render_device_info(c: &mut Composer, request: &ReportRequest) {
    c.heading("Device & Scan Information");
    let style = c.style;

    let left = [
        format!("Vendor: {}", request.vendor),
        format!("Product: {}", request.product),
        format!("Version: {}", request.version),
    ];
    let right = scan_lines(request);

    let rows = left.len().max(right.len());
    let height = rows as f32 * style.card_line_height + style.card_padding;
    c.ensure_space(height + style.section_gap);

    let top = c.cursor.y();
    c.rect_at(style.margin, top - height, style.content_width(), height, style.card_fill);

    let mut y = top - 18.0;
    for i in 0..rows {
        if let Some(text) = left.get(i) {
            c.text_at(text.as_str(), style.margin + 16.0, y, style.base_size, FontId::Regular, style.text);
        }
        if let Some(text) = right.get(i) {
            c.text_at(text.as_str(), style.margin + 220.0, y, style.base_size, FontId::Regular, style.text);
        }
        y -= style.card_line_height;
    }
    c.cursor.advance(height + style.section_gap);
}

/// One pre-wrapped line of the recommendations card.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct CardBlock {
    pub(crate) text: String,
    pub(crate) bold: bool,
    pub(crate) indent: f32,
    pub(crate) justify: bool,
}

impl CardBlock {
    fn heading(text: &str) -> Self {
        CardBlock {
            text: text.to_string(),
            bold: true,
            indent: 0.0,
            justify: false,
        }
    }

    fn body(text: String, indent: f32) -> Self {
        CardBlock {
            text,
            bold: false,
            indent,
            justify: true,
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

fn push_paragraph(blocks: &mut Vec<CardBlock>, text: &str, size: f32, width: f32, font: &dyn TextMeasure) {
    blocks.extend(
        wrap_text(text, size, width, font)
            .into_iter()
            .map(|line| CardBlock::body(line, 0.0)),
    );
}

/// A bold title followed by each non-blank item prefixed with `marker(i)`,
/// wrapped and indented. Blank items draw nothing but keep their number.
fn push_list(
    blocks: &mut Vec<CardBlock>,
    title: &str,
    items: &[String],
    marker: impl Fn(usize) -> String,
    style: &ReportStyle,
    font: &dyn TextMeasure,
) {
    if items.is_empty() {
        return;
    }
    let width = style.content_width() - 32.0 - style.item_indent;
    blocks.push(CardBlock::heading(title));
    for (i, item) in items.iter().enumerate() {
        if item.trim().is_empty() {
            continue;
        }
        // Marker is wrapped with the item, not prefixed afterwards: a nearly
        // full first line must not overflow `width` by the marker.
        let marked = format!("{}{item}", marker(i));
        blocks.extend(
            wrap_text(&marked, style.base_size, width, font)
                .into_iter()
                .map(|line| CardBlock::body(line, style.item_indent)),
        );
    }
}

/// Measure pass of the recommendations card: every line it will draw, in order.
pub(crate) fn build_card_blocks(c: &Composer, analysis: Option<&Analysis>) -> Vec<CardBlock> {
    let Some(analysis) = analysis else {
        return Vec::new();
    };
    let style = c.style;
    let font = c.font(FontId::Regular);
    let size = style.base_size;
    let text_width = style.content_width() - 32.0;

    let mut blocks = Vec::new();
    if let Some(risk) = non_empty(&analysis.risk_level) {
        blocks.push(CardBlock::heading("Risk Level:"));
        push_paragraph(&mut blocks, risk, size, text_width, font);
    }
    if let Some(summary) = non_empty(&analysis.summary) {
        push_paragraph(&mut blocks, summary, size, text_width, font);
    }
    push_list(
        &mut blocks,
        "Recommendations:",
        &analysis.recommendations,
        |_| "- ".to_string(),
        style,
        font,
    );
    push_list(
        &mut blocks,
        "Priority Actions:",
        &analysis.priority_actions,
        |i| format!("{}. ", i + 1),
        style,
        font,
    );
    blocks
}

/// Card lines drawn on each page, starting with the page whose segment top is
/// `first_top`. A segment holds as many lines as fit with the card padding
/// still above the bottom margin; continuation segments start at a page top.
fn split_card(first_top: f32, total: usize, style: &ReportStyle) -> Vec<usize> {
    let capacity = |top: f32| {
        let room = top - style.margin - style.card_padding;
        ((room / style.card_line_height).floor().max(0.0) as usize).max(1)
    };

    let mut segments = Vec::new();
    let mut remaining = total;
    let mut top = first_top;
    loop {
        let take = remaining.min(capacity(top));
        segments.push(take);
        remaining -= take;
        if remaining == 0 {
            return segments;
        }
        top = style.page_top();
    }
}

fn draw_block(c: &mut Composer, block: &CardBlock, y: f32) {
    let style = c.style;
    let font = if block.bold { FontId::Bold } else { FontId::Regular };
    let x = style.margin + 16.0 + block.indent;

    if !block.justify {
        c.text_at(block.text.as_str(), x, y, style.base_size, font, style.text);
        return;
    }

    let words: Vec<&str> = block.text.split_whitespace().collect();
    let available = style.content_width() - 32.0 - block.indent;
    let chunks = justify_words(&words, style.base_size, available, c.font(font));
    for chunk in chunks {
        c.text_at(chunk.text, x + chunk.x_offset, y, style.base_size, font, style.text);
    }
}

/// Risk, summary and action lists on a shaded card. The whole block list is
/// measured before the background is drawn; text goes on top of it.
pub(super) fn render_recommendations(c: &mut Composer, analysis: Option<&Analysis>) {
    c.heading("Recommendations");
    let style = c.style;
    let line_h = style.card_line_height;

    let blocks = build_card_blocks(c, analysis);
    let height = blocks.len() as f32 * line_h + style.card_padding;
    c.ensure_space(height + style.section_gap);

    let segments = split_card(c.cursor.y(), blocks.len(), style);
    if segments.len() > 1 {
        log::debug!(
            "Recommendations card of {} lines split over {} pages",
            blocks.len(),
            segments.len()
        );
    }

    let mut remaining = blocks.as_slice();
    for (i, count) in segments.into_iter().enumerate() {
        if i > 0 {
            c.cursor.break_page(&mut c.doc);
        }
        let (segment, rest) = remaining.split_at(count);
        remaining = rest;

        let top = c.cursor.y();
        let segment_h = count as f32 * line_h + style.card_padding;
        c.rect_at(style.margin, top - segment_h, style.content_width(), segment_h, style.card_fill);

        let mut y = top - 18.0;
        for block in segment {
            draw_block(c, block, y);
            y -= line_h;
        }
        c.cursor.advance(count as f32 * line_h);
    }
    c.cursor.advance(style.card_padding);
}
