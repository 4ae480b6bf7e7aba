mod error;
mod fonts;
mod model;
mod pdf;
mod style;

pub use error::Error;
pub use fonts::{FontConfig, FontEntry, FontId, FontSet, TextMeasure};
pub use model::{
    Analysis, ReportDownload, ReportRequest, ScanMeta, format_timestamp, normalize_cve_list,
};
pub use pdf::{
    Cursor, Document, DrawOp, Page, WordChunk, justify_words, layout_report, nvd_detail_url,
    render, wrap_text,
};
pub use style::ReportStyle;

use std::path::Path;
use std::time::Instant;

/// Generate a report with the built-in Helvetica fonts and default style.
pub fn generate_report(request: &ReportRequest) -> Result<Vec<u8>, Error> {
    generate_report_with(request, FontSet::default(), &ReportStyle::default())
}

pub fn generate_report_with(
    request: &ReportRequest,
    fonts: FontSet,
    style: &ReportStyle,
) -> Result<Vec<u8>, Error> {
    let t0 = Instant::now();

    let doc = layout_report(request, fonts, style);
    let t_layout = t0.elapsed();

    let bytes = render(&doc)?;
    let t_total = t0.elapsed();

    log::info!(
        "Timing: layout={:.1}ms, render={:.1}ms, total={:.1}ms ({} pages, {} CVEs, output {} bytes)",
        t_layout.as_secs_f64() * 1000.0,
        (t_total - t_layout).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        doc.pages().len(),
        request.cve_list.len(),
        bytes.len(),
    );

    Ok(bytes)
}

/// Validate a JSON request body and produce the download a host should send.
/// Errors for which [`Error::is_client_error`] holds map to HTTP 400.
pub fn generate_download(body: &[u8], fonts: &FontConfig) -> Result<ReportDownload, Error> {
    let request = ReportRequest::from_json(body)?;
    let fonts = FontSet::load(fonts)?;
    let bytes = generate_report_with(&request, fonts, &ReportStyle::default())?;
    Ok(ReportDownload { bytes })
}

pub fn convert_json_to_pdf(input: &Path, output: &Path, fonts: &FontConfig) -> Result<(), Error> {
    let body = std::fs::read(input)?;
    convert_json_bytes_to_pdf(&body, output, fonts)
}

pub fn convert_json_bytes_to_pdf(
    body: &[u8],
    output: &Path,
    fonts: &FontConfig,
) -> Result<(), Error> {
    let t0 = Instant::now();

    let request = ReportRequest::from_json(body)?;
    let t_parse = t0.elapsed();

    let fonts = FontSet::load(fonts)?;
    let bytes = generate_report_with(&request, fonts, &ReportStyle::default())?;
    let t_render = t0.elapsed();

    std::fs::write(output, &bytes)?;
    let t_total = t0.elapsed();

    log::info!(
        "Timing: parse={:.1}ms, generate={:.1}ms, write={:.1}ms, total={:.1}ms (output {} bytes)",
        t_parse.as_secs_f64() * 1000.0,
        (t_render - t_parse).as_secs_f64() * 1000.0,
        (t_total - t_render).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        bytes.len(),
    );

    Ok(())
}
