/// Geometry, type sizes and palette for a report. All values are in PDF points.
#[derive(Clone, Debug)]
pub struct ReportStyle {
    pub page_width: f32,
    pub page_height: f32,
    pub margin: f32,
    pub cover_height: f32,
    pub row_height: f32,
    pub card_line_height: f32,
    pub card_padding: f32,
    /// Gap left below cards and tables before the next section.
    pub section_gap: f32,
    pub item_indent: f32,

    pub base_size: f32,
    pub heading_size: f32,
    pub title_size: f32,
    pub timestamp_size: f32,
    pub footer_size: f32,

    pub primary: [u8; 3],
    pub text: [u8; 3],
    pub muted: [u8; 3],
    pub border: [u8; 3],
    pub card_fill: [u8; 3],
    pub table_header_fill: [u8; 3],
    pub cover_text: [u8; 3],

    pub title: String,
    pub footer_text: String,
}

impl Default for ReportStyle {
    fn default() -> Self {
        ReportStyle {
            page_width: 595.28,
            page_height: 841.89,
            margin: 50.0,
            cover_height: 80.0,
            row_height: 20.0,
            card_line_height: 16.0,
            card_padding: 24.0,
            section_gap: 24.0,
            item_indent: 32.0,

            base_size: 11.0,
            heading_size: 12.0,
            title_size: 28.0,
            timestamp_size: 12.0,
            footer_size: 10.0,

            primary: [0x0e, 0xa5, 0xe9],
            text: [0x11, 0x18, 0x27],
            muted: [0x6b, 0x72, 0x80],
            border: [0xe5, 0xe7, 0xeb],
            card_fill: [0xf3, 0xf4, 0xf6],
            table_header_fill: [0xec, 0xf5, 0xff],
            cover_text: [0xff, 0xff, 0xff],

            title: "VulnTrack Security Report".to_string(),
            footer_text: "Confidential \u{2013} For authorized use only".to_string(),
        }
    }
}

impl ReportStyle {
    pub fn content_width(&self) -> f32 {
        self.page_width - self.margin * 2.0
    }

    /// Cursor position at the top of a fresh page.
    pub fn page_top(&self) -> f32 {
        self.page_height - self.margin
    }

    pub fn footer_label(&self, page_num: usize) -> String {
        format!("{} | Page {}", self.footer_text, page_num)
    }
}
