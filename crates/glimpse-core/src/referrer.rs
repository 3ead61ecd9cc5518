use url::Url;

pub const DIRECT_REFERRER: &str = "direct";
pub const UNKNOWN_REFERRER: &str = "unknown";

/// Normalise a raw referrer into the label used for grouping.
///
/// - absent, empty or the literal `"direct"` → `"direct"`
/// - an absolute URL → its host, e.g. `https://google.com/search` → `google.com`
/// - anything without an extractable host → `"unknown"`
pub fn normalize_referrer(raw: Option<&str>) -> String {
    let raw = match raw.map(str::trim) {
        None | Some("") => return DIRECT_REFERRER.to_string(),
        Some(r) if r == DIRECT_REFERRER => return DIRECT_REFERRER.to_string(),
        Some(r) => r,
    };

    Url::parse(raw)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string))
        .filter(|host| !host.is_empty())
        .unwrap_or_else(|| UNKNOWN_REFERRER.to_string())
}
