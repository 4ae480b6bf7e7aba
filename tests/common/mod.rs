#![allow(dead_code)]

use std::collections::BTreeMap;

use serde_json::{Value, json};
use vulntrack_report::{
    Document, DrawOp, FontId, FontSet, Page, ReportRequest, ReportStyle, TextMeasure,
    layout_report,
};

/// Every char has the same advance, so expected widths are easy to compute.
pub struct Monospace(pub f32);

impl TextMeasure for Monospace {
    fn char_width_1000(&self, _ch: char) -> f32 {
        self.0
    }
}

pub fn request(payload: Value) -> ReportRequest {
    ReportRequest::from_value(payload).expect("valid payload")
}

pub fn layout(payload: Value) -> Document {
    layout_report(&request(payload), FontSet::default(), &ReportStyle::default())
}

pub fn cve_ids(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("CVE-2024-{:04}", 1000 + i)).collect()
}

pub fn minimal_payload() -> Value {
    json!({
        "vendor": "Acme",
        "product": "Router",
        "version": "1.0",
        "cves": [],
        "generatedAt": "2024-03-05 14:07",
    })
}

pub fn full_payload() -> Value {
    json!({
        "vendor": "Acme",
        "product": "Router X200",
        "version": "4.2.1",
        "scan": {
            "id": "scan-42",
            "type": "FULL",
            "status": "COMPLETED",
            "startedAt": "2024-03-05T13:00:00Z",
            "totalDevices": 12
        },
        "cves": ["CVE-2024-1111", { "cveId": "CVE-2024-2222", "severity": "HIGH" }],
        "analysis": {
            "riskLevel": "HIGH",
            "summary": "Two remotely exploitable flaws affect the management interface of the device.",
            "impact": "An attacker on the local network can take over the router.",
            "recommendations": [
                "Upgrade the firmware to the latest vendor release.",
                "Disable remote management on WAN interfaces."
            ],
            "priorityActions": [
                "Patch CVE-2024-1111 within 48 hours.",
                "Audit administrator accounts."
            ]
        },
        "generatedAt": "2024-03-05 14:07",
    })
}

pub fn all_texts(page: &Page) -> Vec<&str> {
    page.texts().map(|(text, _)| text).collect()
}

pub fn footer_texts(page: &Page) -> Vec<&str> {
    page.texts()
        .map(|(text, _)| text)
        .filter(|text| text.starts_with("Confidential"))
        .collect()
}

pub struct TextRun<'a> {
    pub index: usize,
    pub text: &'a str,
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub font: FontId,
}

pub fn text_runs(page: &Page) -> Vec<TextRun<'_>> {
    page.ops()
        .iter()
        .enumerate()
        .filter_map(|(index, op)| match op {
            DrawOp::Text {
                x,
                y,
                size,
                font,
                text,
                ..
            } => Some(TextRun {
                index,
                text: text.as_str(),
                x: *x,
                y: *y,
                size: *size,
                font: *font,
            }),
            _ => None,
        })
        .collect()
}

/// Group text runs into visual lines keyed by baseline, top of the page first.
pub fn lines_by_baseline<'a>(runs: &[TextRun<'a>]) -> Vec<Vec<&'a str>> {
    let mut lines: BTreeMap<i64, Vec<(f32, &'a str)>> = BTreeMap::new();
    for run in runs {
        let key = -(run.y * 100.0).round() as i64;
        lines.entry(key).or_default().push((run.x, run.text));
    }
    lines
        .into_values()
        .map(|mut words| {
            words.sort_by(|a, b| a.0.total_cmp(&b.0));
            words.into_iter().map(|(_, w)| w).collect()
        })
        .collect()
}

/// Page count recorded in the page tree.
pub fn pdf_page_count(bytes: &[u8]) -> Option<usize> {
    let text = String::from_utf8_lossy(bytes);
    let start = text.find("/Count ")? + "/Count ".len();
    let digits: String = text[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

pub fn count_occurrences(bytes: &[u8], needle: &str) -> usize {
    String::from_utf8_lossy(bytes).matches(needle).count()
}

/// Advance of every glyph in [`fixed_pitch_ttf`], in 1000-units of the em.
pub const TTF_ADVANCE: u16 = 600;

/// A minimal TrueType font named "TestSans": printable ASCII plus U+2013,
/// every glyph `TTF_ADVANCE` wide and without outlines.
pub fn fixed_pitch_ttf() -> Vec<u8> {
    const GLYPHS: u16 = 97; // .notdef, 0x20..=0x7E, U+2013

    let be16 = |out: &mut Vec<u8>, v: u16| out.extend_from_slice(&v.to_be_bytes());
    let be32 = |out: &mut Vec<u8>, v: u32| out.extend_from_slice(&v.to_be_bytes());

    // cmap: one format 4 subtable, Windows Unicode BMP.
    let segments: [(u16, u16, i16); 3] = [
        (0x20, 0x7E, 1 - 0x20),
        (0x2013, 0x2013, 96 - 0x2013),
        (0xFFFF, 0xFFFF, 1),
    ];
    let mut sub = Vec::new();
    let seg_count = segments.len() as u16;
    be16(&mut sub, 4);
    be16(&mut sub, 16 + seg_count * 8);
    be16(&mut sub, 0);
    be16(&mut sub, seg_count * 2);
    be16(&mut sub, 4);
    be16(&mut sub, 1);
    be16(&mut sub, seg_count * 2 - 4);
    segments.iter().for_each(|s| be16(&mut sub, s.1));
    be16(&mut sub, 0);
    segments.iter().for_each(|s| be16(&mut sub, s.0));
    segments.iter().for_each(|s| be16(&mut sub, s.2 as u16));
    segments.iter().for_each(|_| be16(&mut sub, 0));
    let mut cmap = Vec::new();
    be16(&mut cmap, 0);
    be16(&mut cmap, 1);
    be16(&mut cmap, 3);
    be16(&mut cmap, 1);
    be32(&mut cmap, 12);
    cmap.extend(sub);

    let mut head = Vec::new();
    be32(&mut head, 0x0001_0000);
    be32(&mut head, 0x0001_0000);
    be32(&mut head, 0);
    be32(&mut head, 0x5F0F_3CF5);
    be16(&mut head, 0);
    be16(&mut head, 1000);
    head.extend([0u8; 16]);
    for v in [0i16, -200, 600, 800] {
        be16(&mut head, v as u16);
    }
    be16(&mut head, 0);
    be16(&mut head, 8);
    be16(&mut head, 2);
    be16(&mut head, 0); // short loca
    be16(&mut head, 0);

    let mut hhea = Vec::new();
    be32(&mut hhea, 0x0001_0000);
    for v in [800i16, -200, 0] {
        be16(&mut hhea, v as u16);
    }
    be16(&mut hhea, TTF_ADVANCE);
    hhea.extend([0u8; 22]);
    be16(&mut hhea, 1); // one long metric shared by every glyph

    let mut hmtx = Vec::new();
    be16(&mut hmtx, TTF_ADVANCE);
    be16(&mut hmtx, 0);
    (1..GLYPHS).for_each(|_| be16(&mut hmtx, 0));

    let loca = vec![0u8; (GLYPHS as usize + 1) * 2];

    let mut maxp = Vec::new();
    be32(&mut maxp, 0x0000_5000);
    be16(&mut maxp, GLYPHS);

    let family: Vec<u8> = "TestSans".encode_utf16().flat_map(u16::to_be_bytes).collect();
    let mut name = Vec::new();
    be16(&mut name, 0);
    be16(&mut name, 1);
    be16(&mut name, 18);
    for v in [3u16, 1, 0x409, 1, family.len() as u16, 0] {
        be16(&mut name, v);
    }
    name.extend(family);

    let mut post = Vec::new();
    be32(&mut post, 0x0003_0000);
    post.extend([0u8; 28]);

    // Records must be sorted by tag.
    let tables: [(&[u8; 4], Vec<u8>); 9] = [
        (b"cmap", cmap),
        (b"glyf", Vec::new()),
        (b"head", head),
        (b"hhea", hhea),
        (b"hmtx", hmtx),
        (b"loca", loca),
        (b"maxp", maxp),
        (b"name", name),
        (b"post", post),
    ];

    let mut font = Vec::new();
    be32(&mut font, 0x0001_0000);
    be16(&mut font, tables.len() as u16);
    be16(&mut font, 128);
    be16(&mut font, 3);
    be16(&mut font, tables.len() as u16 * 16 - 128);

    let mut offset = 12 + tables.len() * 16;
    let mut body = Vec::new();
    for (tag, data) in &tables {
        font.extend_from_slice(*tag);
        be32(&mut font, 0);
        be32(&mut font, offset as u32);
        be32(&mut font, data.len() as u32);
        body.extend_from_slice(data);
        while body.len() % 4 != 0 {
            body.push(0);
        }
        offset = 12 + tables.len() * 16 + body.len();
    }
    font.extend(body);
    font
}
