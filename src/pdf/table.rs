use crate::fonts::FontId;

use super::Composer;

const NVD_DETAIL_URL: &str = "https://nvd.nist.gov/vuln/detail/";

/// Column x positions relative to the left margin.
const ID_COLUMN: f32 = 8.0;
const URL_COLUMN: f32 = 180.0;

/// Row text baseline below the row top.
const ROW_BASELINE: f32 = 13.0;

pub fn nvd_detail_url(cve_id: &str) -> String {
    format!("{NVD_DETAIL_URL}{cve_id}")
}

fn render_header_row(c: &mut Composer) {
    let style = c.style;
    let y = c.cursor.y();
    let baseline = y - ROW_BASELINE;
    c.rect_at(
        style.margin,
        y - style.row_height + 8.0,
        style.content_width(),
        style.row_height,
        style.table_header_fill,
    );
    c.text_at("CVE ID", style.margin + ID_COLUMN, baseline, style.base_size, FontId::Bold, style.primary);
    c.text_at(
        "NVD Details",
        style.margin + URL_COLUMN,
        baseline,
        style.base_size,
        FontId::Bold,
        style.primary,
    );
    c.cursor.advance(style.row_height);
    let y = c.cursor.y();
    c.line_at((style.margin, y), (style.margin + style.content_width(), y), 1.0, style.border);
}

/// Two-column CVE table. Rows never straddle a page: a row that does not fit
/// moves to a new page, which repeats the header row first.
pub(super) fn render_vulnerability_table(c: &mut Composer, cves: &[String]) {
    c.heading("Vulnerabilities Detected");
    let style = c.style;

    if cves.is_empty() {
        c.ensure_space(style.section_gap);
        c.flow_text("None", style.base_size, FontId::Regular, style.text);
        c.cursor.advance(style.section_gap);
        return;
    }

    c.ensure_space(style.row_height + style.section_gap);
    render_header_row(c);

    for id in cves {
        if c.ensure_space(style.row_height + 4.0) {
            render_header_row(c);
        }
        let baseline = c.cursor.y() - ROW_BASELINE;
        c.text_at(id.as_str(), style.margin + ID_COLUMN, baseline, style.base_size, FontId::Regular, style.text);
        c.text_at(
            nvd_detail_url(id),
            style.margin + URL_COLUMN,
            baseline,
            style.base_size,
            FontId::Regular,
            style.primary,
        );
        c.cursor.advance(style.row_height);
        let y = c.cursor.y();
        c.line_at((style.margin, y), (style.margin + style.content_width(), y), 0.5, style.border);
    }
    c.cursor.advance(style.section_gap);
}
