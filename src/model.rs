use chrono::{DateTime, FixedOffset, Local, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use serde_json::Value;

use crate::error::Error;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScanMeta {
    pub id: String,
    pub scan_type: String,
    pub status: String,
    pub started_at: String,
    pub total_devices: Option<u64>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Analysis {
    pub risk_level: Option<String>,
    pub summary: Option<String>,
    pub impact: Option<String>,
    pub recommendations: Vec<String>,
    pub priority_actions: Vec<String>,
}

/// Everything one report is generated from. Absent strings are empty, never errors.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReportRequest {
    pub vendor: String,
    pub product: String,
    pub version: String,
    pub scan: Option<ScanMeta>,
    pub cve_list: Vec<String>,
    pub analysis: Option<Analysis>,
    pub generated_at: Option<String>,
    pub locale: Option<String>,
    pub time_zone: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawScan {
    #[serde(default)]
    id: Option<String>,
    #[serde(default, rename = "type")]
    scan_type: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    started_at: Option<String>,
    #[serde(default)]
    total_devices: Option<u64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAnalysis {
    #[serde(default)]
    risk_level: Option<String>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    impact: Option<String>,
    #[serde(default)]
    recommendations: Option<Vec<String>>,
    #[serde(default)]
    priority_actions: Option<Vec<String>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRequest {
    #[serde(default)]
    vendor: Option<String>,
    #[serde(default)]
    product: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    scan: Option<RawScan>,
    #[serde(default)]
    cves: Value,
    #[serde(default)]
    analysis: Option<RawAnalysis>,
    #[serde(default)]
    generated_at: Option<String>,
    #[serde(default)]
    locale: Option<String>,
    #[serde(default)]
    time_zone: Option<String>,
}

/// Flatten a `cves` payload into plain ids. Entries may be strings or objects
/// carrying a `cveId`; anything that does not resolve to a non-empty string is
/// dropped. A non-array value yields an empty list.
pub fn normalize_cve_list(cves: &Value) -> Vec<String> {
    let Some(items) = cves.as_array() else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.as_str()),
            Value::Object(obj) => obj.get("cveId").and_then(Value::as_str),
            _ => None,
        })
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

impl ReportRequest {
    /// Parse and validate a request body. The body must be a JSON object whose
    /// fields, when present and non-null, have the documented types.
    pub fn from_json(body: &[u8]) -> Result<Self, Error> {
        let value: Value = serde_json::from_slice(body).map_err(Error::InvalidJson)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, Error> {
        if !value.is_object() {
            return Err(Error::InvalidRequest(
                "request body must be a JSON object".to_string(),
            ));
        }
        let raw: RawRequest =
            serde_json::from_value(value).map_err(|e| Error::InvalidRequest(e.to_string()))?;

        let cve_list = normalize_cve_list(&raw.cves);
        let scan = raw.scan.map(|s| ScanMeta {
            id: s.id.unwrap_or_default(),
            scan_type: s.scan_type.unwrap_or_default(),
            status: s.status.unwrap_or_default(),
            started_at: s.started_at.unwrap_or_default(),
            total_devices: s.total_devices,
        });
        let analysis = raw.analysis.map(|a| Analysis {
            risk_level: a.risk_level,
            summary: a.summary,
            impact: a.impact,
            recommendations: a.recommendations.unwrap_or_default(),
            priority_actions: a.priority_actions.unwrap_or_default(),
        });

        Ok(ReportRequest {
            vendor: raw.vendor.unwrap_or_default(),
            product: raw.product.unwrap_or_default(),
            version: raw.version.unwrap_or_default(),
            scan,
            cve_list,
            analysis,
            generated_at: raw.generated_at,
            locale: raw.locale,
            time_zone: raw.time_zone,
        })
    }

    /// The cover timestamp: `generated_at` verbatim, else the current time
    /// formatted for the request's locale and time zone.
    pub fn timestamp_label(&self) -> String {
        match self.generated_at.as_deref() {
            Some(ts) if !ts.is_empty() => ts.to_string(),
            _ => format_timestamp(
                Utc::now(),
                self.locale.as_deref(),
                self.time_zone.as_deref(),
            ),
        }
    }
}

/// Zone a cover timestamp is rendered in.
enum Zone {
    Fixed(FixedOffset),
    Named(Tz),
}

fn parse_time_zone(tz: &str) -> Option<Zone> {
    let tz = tz.trim();
    if let Some(offset) = parse_fixed_offset(tz) {
        return Some(Zone::Fixed(offset));
    }
    tz.parse::<Tz>().ok().map(Zone::Named)
}

fn parse_fixed_offset(tz: &str) -> Option<FixedOffset> {
    if tz == "Z" {
        return FixedOffset::east_opt(0);
    }
    let (sign, rest) = match tz.as_bytes().first()? {
        b'+' => (1, &tz[1..]),
        b'-' => (-1, &tz[1..]),
        _ => return None,
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

fn locale_pattern(locale: Option<&str>) -> &'static str {
    let lang = locale
        .map(|l| l.to_ascii_lowercase().replace('_', "-"))
        .unwrap_or_else(|| "en-us".to_string());
    if lang == "en-us" || lang == "en" {
        "%-m/%-d/%Y, %-I:%M:%S %p"
    } else if lang.starts_with("de") {
        "%-d.%-m.%Y, %H:%M:%S"
    } else {
        "%d/%m/%Y, %H:%M:%S"
    }
}

/// Format `now` the way a browser's `toLocaleString` would for the common
/// locales. Time zones are IANA names (`Europe/Oslo`), `Z`, or a fixed
/// `±HH:MM` offset; anything else falls back to the host's local time.
pub fn format_timestamp(now: DateTime<Utc>, locale: Option<&str>, time_zone: Option<&str>) -> String {
    let pattern = locale_pattern(locale);
    match time_zone {
        Some(tz) => match parse_time_zone(tz) {
            Some(Zone::Fixed(offset)) => now.with_timezone(&offset).format(pattern).to_string(),
            Some(Zone::Named(zone)) => now.with_timezone(&zone).format(pattern).to_string(),
            None => {
                log::warn!("Unsupported time zone {tz:?}, using local time");
                now.with_timezone(&Local).format(pattern).to_string()
            }
        },
        None => now.with_timezone(&Local).format(pattern).to_string(),
    }
}

/// A finished report as a host HTTP layer should deliver it.
pub struct ReportDownload {
    pub bytes: Vec<u8>,
}

impl ReportDownload {
    pub const CONTENT_TYPE: &'static str = "application/pdf";
    pub const FILENAME: &'static str = "vulntrack-report.pdf";
    pub const CACHE_CONTROL: &'static str = "no-store";

    pub fn content_disposition(&self) -> String {
        format!("attachment; filename=\"{}\"", Self::FILENAME)
    }

    pub fn headers(&self) -> [(&'static str, String); 3] {
        [
            ("Content-Type", Self::CONTENT_TYPE.to_string()),
            ("Content-Disposition", self.content_disposition()),
            ("Cache-Control", Self::CACHE_CONTROL.to_string()),
        ]
    }
}
