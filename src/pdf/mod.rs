mod layout;
mod page;
mod sections;
mod table;

use std::collections::{HashMap, HashSet};

use pdf_writer::{Content, Filter, Name, Pdf, Rect, Ref, Str, TextStr};

use crate::error::Error;
use crate::fonts::{FontId, FontSet, RegisteredFont, TextMeasure, register_font};
use crate::model::ReportRequest;
use crate::style::ReportStyle;

pub use layout::{WordChunk, justify_words, wrap_text};
pub use page::{Cursor, Document, DrawOp, Page};
pub use table::nvd_detail_url;

/// Shared state of one layout pass: the document being built, the cursor over
/// it and the style everything is measured against.
pub(crate) struct Composer<'s> {
    pub(crate) doc: Document,
    pub(crate) cursor: Cursor,
    pub(crate) style: &'s ReportStyle,
}

impl<'s> Composer<'s> {
    fn new(fonts: FontSet, style: &'s ReportStyle) -> Self {
        Composer {
            doc: Document::new(fonts, style),
            cursor: Cursor::new(style),
            style,
        }
    }

    pub(crate) fn font(&self, id: FontId) -> &dyn TextMeasure {
        self.doc.fonts().get(id)
    }

    pub(crate) fn measure(&self, text: &str, size: f32, font: FontId) -> f32 {
        self.doc.fonts().get(font).text_width(text, size)
    }

    /// X that centres `text` within the content width.
    pub(crate) fn centered_x(&self, text: &str, size: f32, font: FontId) -> f32 {
        let style = self.style;
        style.margin + (style.content_width() - self.measure(text, size, font)) / 2.0
    }

    pub(crate) fn ensure_space(&mut self, required: f32) -> bool {
        self.cursor.ensure_space(&mut self.doc, required)
    }

    pub(crate) fn text_at(
        &mut self,
        text: impl Into<String>,
        x: f32,
        y: f32,
        size: f32,
        font: FontId,
        color: [u8; 3],
    ) {
        let page = self.cursor.page();
        self.doc.page_mut(page).push(DrawOp::Text {
            x,
            y,
            size,
            font,
            color,
            text: text.into(),
        });
    }

    pub(crate) fn line_at(&mut self, from: (f32, f32), to: (f32, f32), thickness: f32, color: [u8; 3]) {
        let page = self.cursor.page();
        self.doc.page_mut(page).push(DrawOp::Line {
            from,
            to,
            thickness,
            color,
        });
    }

    pub(crate) fn rect_at(&mut self, x: f32, y: f32, width: f32, height: f32, color: [u8; 3]) {
        let page = self.cursor.page();
        self.doc.page_mut(page).push(DrawOp::Rect {
            x,
            y,
            width,
            height,
            color,
        });
    }

    /// Text whose top sits at the cursor; the cursor moves below it.
    pub(crate) fn flow_text(&mut self, text: &str, size: f32, font: FontId, color: [u8; 3]) {
        let y = self.cursor.y() - size;
        self.text_at(text, self.style.margin, y, size, font, color);
        self.cursor.advance(size + 4.0);
    }

    /// Horizontal rule at the cursor, starting at the left margin.
    pub(crate) fn rule(&mut self, length: f32, color: [u8; 3]) {
        let (x, y) = (self.style.margin, self.cursor.y());
        self.line_at((x, y), (x + length, y), 1.0, color);
        self.cursor.advance(12.0);
    }

    pub(crate) fn heading(&mut self, title: &str) {
        self.ensure_space(40.0);
        let style = self.style;
        self.flow_text(&title.to_uppercase(), style.heading_size, FontId::Bold, style.primary);
        self.rule(150.0, style.primary);
    }
}

/// Lay out a report into pages of drawing operations, footers included.
pub fn layout_report(request: &ReportRequest, fonts: FontSet, style: &ReportStyle) -> Document {
    let mut composer = Composer::new(fonts, style);

    sections::render_cover(&mut composer, &request.timestamp_label());
    sections::render_device_info(&mut composer, request);
    table::render_vulnerability_table(&mut composer, &request.cve_list);
    sections::render_recommendations(&mut composer, request.analysis.as_ref());

    let mut doc = composer.doc;
    stamp_footers(&mut doc, style);
    doc
}

/// Second pass over the finished page list; independent of the layout cursor.
fn stamp_footers(doc: &mut Document, style: &ReportStyle) {
    let footer_y = style.margin - 20.0;
    let labels: Vec<(String, f32)> = (1..=doc.pages().len())
        .map(|n| {
            let label = style.footer_label(n);
            let width = doc.fonts().regular.text_width(&label, style.footer_size);
            let x = style.margin + (style.content_width() - width) / 2.0;
            (label, x)
        })
        .collect();

    for (page, (label, x)) in doc.pages_mut().iter_mut().zip(labels) {
        page.push(DrawOp::Text {
            x,
            y: footer_y,
            size: style.footer_size,
            font: FontId::Regular,
            color: style.muted,
            text: label,
        });
    }
}

fn set_fill(content: &mut Content, current: &mut Option<[u8; 3]>, color: [u8; 3]) {
    if *current != Some(color) {
        let [r, g, b] = color;
        content.set_fill_rgb(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0);
        *current = Some(color);
    }
}

fn page_content(page: &Page, fonts: &HashMap<FontId, RegisteredFont>) -> Result<Content, Error> {
    let mut content = Content::new();
    let mut fill: Option<[u8; 3]> = None;

    for op in page.ops() {
        match op {
            DrawOp::Rect {
                x,
                y,
                width,
                height,
                color,
            } => {
                set_fill(&mut content, &mut fill, *color);
                content.rect(*x, *y, *width, *height);
                content.fill_nonzero();
            }
            DrawOp::Line {
                from,
                to,
                thickness,
                color,
            } => {
                let [r, g, b] = *color;
                content.save_state();
                content.set_stroke_rgb(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0);
                content.set_line_width(*thickness);
                content.move_to(from.0, from.1);
                content.line_to(to.0, to.1);
                content.stroke();
                content.restore_state();
            }
            DrawOp::Text {
                x,
                y,
                size,
                font,
                color,
                text,
            } => {
                let registered = fonts
                    .get(font)
                    .ok_or_else(|| Error::Pdf(format!("font {font:?} not registered")))?;
                set_fill(&mut content, &mut fill, *color);
                content.begin_text();
                content.set_font(Name(registered.pdf_name.as_bytes()), *size);
                content.next_line(*x, *y);
                content.show(Str(&registered.encode(text)));
                content.end_text();
            }
        }
    }
    Ok(content)
}

/// Serialize a laid-out document.
pub fn render(doc: &Document) -> Result<Vec<u8>, Error> {
    let t0 = std::time::Instant::now();
    let mut pdf = Pdf::new();
    let mut next_id = 1i32;
    let mut alloc = || {
        let r = Ref::new(next_id);
        next_id += 1;
        r
    };

    let catalog_id = alloc();
    let pages_id = alloc();
    let info_id = alloc();

    // Phase 1: collect used characters per font for subsetting, then embed
    let mut used_chars: HashMap<FontId, HashSet<char>> = HashMap::new();
    for page in doc.pages() {
        for op in page.ops() {
            if let DrawOp::Text { font, text, .. } = op {
                used_chars.entry(*font).or_default().extend(text.chars());
            }
        }
    }
    for chars in used_chars.values_mut() {
        chars.insert(' ');
    }

    let mut fonts: HashMap<FontId, RegisteredFont> = HashMap::new();
    for id in [FontId::Regular, FontId::Bold] {
        let used = used_chars.remove(&id).unwrap_or_default();
        let registered = register_font(&mut pdf, id, doc.fonts().get(id), &used, &mut alloc)?;
        fonts.insert(id, registered);
    }

    let t_fonts = t0.elapsed();

    // Phase 2: content streams
    let n = doc.pages().len();
    let page_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();
    let content_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();

    for (i, page) in doc.pages().iter().enumerate() {
        let raw = page_content(page, &fonts)?.finish();
        let compressed = miniz_oxide::deflate::compress_to_vec_zlib(raw.as_slice(), 6);
        pdf.stream(content_ids[i], &compressed).filter(Filter::FlateDecode);
    }

    let t_content = t0.elapsed();

    // Phase 3: page tree
    pdf.catalog(catalog_id).pages(pages_id);
    pdf.pages(pages_id)
        .kids(page_ids.iter().copied())
        .count(n as i32);
    pdf.document_info(info_id)
        .title(TextStr(doc.title()))
        .producer(TextStr("vulntrack-report"));

    let font_pairs: Vec<(&str, Ref)> = [FontId::Regular, FontId::Bold]
        .iter()
        .filter_map(|id| fonts.get(id))
        .map(|f| (f.pdf_name, f.font_ref))
        .collect();

    for (i, page) in doc.pages().iter().enumerate() {
        let mut pdf_page = pdf.page(page_ids[i]);
        pdf_page
            .media_box(Rect::new(0.0, 0.0, page.width, page.height))
            .parent(pages_id)
            .contents(content_ids[i]);
        let mut resources = pdf_page.resources();
        let mut font_dict = resources.fonts();
        for (name, font_ref) in &font_pairs {
            font_dict.pair(Name(name.as_bytes()), *font_ref);
        }
    }

    let bytes = pdf.finish();

    log::info!(
        "Render phases: font_embed={:.1}ms, content={:.1}ms, assembly={:.1}ms ({} pages)",
        t_fonts.as_secs_f64() * 1000.0,
        (t_content - t_fonts).as_secs_f64() * 1000.0,
        (t0.elapsed() - t_content).as_secs_f64() * 1000.0,
        n,
    );

    Ok(bytes)
}
