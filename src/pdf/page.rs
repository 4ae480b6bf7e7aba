use crate::fonts::{FontId, FontSet};
use crate::style::ReportStyle;

/// A drawing primitive in PDF user space (origin bottom-left, y up).
#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    /// `y` is the text baseline.
    Text {
        x: f32,
        y: f32,
        size: f32,
        font: FontId,
        color: [u8; 3],
        text: String,
    },
    Line {
        from: (f32, f32),
        to: (f32, f32),
        thickness: f32,
        color: [u8; 3],
    },
    /// Filled rectangle; (`x`, `y`) is the lower-left corner.
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: [u8; 3],
    },
}

#[derive(Clone, Debug)]
pub struct Page {
    pub width: f32,
    pub height: f32,
    ops: Vec<DrawOp>,
}

impl Page {
    fn new(width: f32, height: f32) -> Self {
        Page {
            width,
            height,
            ops: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, op: DrawOp) {
        self.ops.push(op);
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    /// Text runs in drawing order, with their baselines.
    pub fn texts(&self) -> impl Iterator<Item = (&str, f32)> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, y, .. } => Some((text.as_str(), *y)),
            _ => None,
        })
    }
}

/// Pages in creation order plus the fonts they were measured with.
pub struct Document {
    pages: Vec<Page>,
    fonts: FontSet,
    title: String,
}

impl Document {
    /// A document with its first page already allocated.
    pub fn new(fonts: FontSet, style: &ReportStyle) -> Self {
        Document {
            pages: vec![Page::new(style.page_width, style.page_height)],
            fonts,
            title: style.title.clone(),
        }
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn fonts(&self) -> &FontSet {
        &self.fonts
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub(crate) fn page_mut(&mut self, index: usize) -> &mut Page {
        &mut self.pages[index]
    }

    pub(crate) fn pages_mut(&mut self) -> &mut [Page] {
        &mut self.pages
    }

    fn add_page(&mut self, width: f32, height: f32) -> usize {
        self.pages.push(Page::new(width, height));
        self.pages.len() - 1
    }
}

/// Vertical write position and the index of the page being drawn on.
#[derive(Clone, Debug)]
pub struct Cursor {
    page: usize,
    y: f32,
    top: f32,
    bottom: f32,
    page_width: f32,
    page_height: f32,
}

impl Cursor {
    pub fn new(style: &ReportStyle) -> Self {
        Cursor {
            page: 0,
            y: style.page_top(),
            top: style.page_top(),
            bottom: style.margin,
            page_width: style.page_width,
            page_height: style.page_height,
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    pub(crate) fn set_y(&mut self, y: f32) {
        self.y = y;
    }

    pub fn fits(&self, required: f32) -> bool {
        self.y - required >= self.bottom
    }

    /// Start a new page when `required` points do not fit above the bottom
    /// margin. Returns true when a break happened.
    pub fn ensure_space(&mut self, doc: &mut Document, required: f32) -> bool {
        if self.fits(required) {
            return false;
        }
        self.break_page(doc);
        true
    }

    pub fn break_page(&mut self, doc: &mut Document) {
        self.page = doc.add_page(self.page_width, self.page_height);
        self.y = self.top;
        log::debug!("Page break → page {}", self.page + 1);
    }

    pub fn advance(&mut self, consumed: f32) {
        self.y -= consumed;
    }
}
