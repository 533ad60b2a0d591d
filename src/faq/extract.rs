//! Text extraction from uploaded files and URLs.

use std::net::{IpAddr, ToSocketAddrs};
use std::path::Path;
use std::time::Duration;

use super::FaqError;

/// File extensions accepted for FAQ document upload.
pub const SUPPORTED_FILE_TYPES: &[&str] = &["txt", "md", "csv", "json"];

/// Cap on fetched URL content.
pub const MAX_URL_CONTENT_BYTES: usize = 10 * 1024 * 1024;

const URL_FETCH_TIMEOUT_SECS: u64 = 30;

/// Hostnames never fetched regardless of DNS resolution.
const BLOCKED_HOSTS: &[&str] = &[
    "localhost",
    "127.0.0.1",
    "0.0.0.0",
    "169.254.169.254",
    "metadata.google.internal",
];

/// Lowercased extension of an upload, if it is one we accept.
pub fn supported_extension(filename: &str) -> Result<String, FaqError> {
    let extension = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    if SUPPORTED_FILE_TYPES.contains(&extension.as_str()) {
        Ok(extension)
    } else {
        Err(FaqError::UnsupportedFileType { extension })
    }
}

/// Decode uploaded bytes as UTF-8, then EUC-KR/CP949 for legacy Korean
/// exports. Bytes neither decoder accepts are rejected rather than
/// stored as mojibake.
pub fn decode_text(bytes: &[u8]) -> Result<String, FaqError> {
    if let Ok(s) = std::str::from_utf8(bytes) {
        return Ok(s.to_string());
    }

    let (text, _, had_errors) = encoding_rs::EUC_KR.decode(bytes);
    if !had_errors {
        tracing::warn!("file is not UTF-8, decoded as EUC-KR");
        return Ok(text.into_owned());
    }

    Err(FaqError::Decode)
}

/// Fetch a URL and return its visible text. HTML is stripped to text;
/// private, loopback, and cloud-metadata addresses are refused.
pub fn fetch_url_content(url: &str) -> Result<String, FaqError> {
    let parsed = reqwest::Url::parse(url).map_err(|e| FaqError::UrlBlocked {
        reason: format!("invalid URL: {e}"),
    })?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(FaqError::UrlBlocked {
            reason: format!("unsupported scheme: {}", parsed.scheme()),
        });
    }

    let host = parsed
        .host_str()
        .ok_or_else(|| FaqError::UrlBlocked {
            reason: "missing host".to_string(),
        })?
        .to_ascii_lowercase();

    if BLOCKED_HOSTS.contains(&host.as_str()) {
        return Err(FaqError::UrlBlocked {
            reason: format!("blocked host: {host}"),
        });
    }

    let port = parsed.port_or_known_default().unwrap_or(443);
    let addrs = (host.as_str(), port)
        .to_socket_addrs()
        .map_err(|e| FaqError::UrlFetch(format!("DNS resolution failed: {e}")))?;
    for addr in addrs {
        if is_internal_address(addr.ip()) {
            return Err(FaqError::UrlBlocked {
                reason: format!("host resolves to internal address {}", addr.ip()),
            });
        }
    }

    tracing::info!(url, "fetching FAQ content from URL");

    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(URL_FETCH_TIMEOUT_SECS))
        .build()
        .map_err(|e| FaqError::UrlFetch(e.to_string()))?;

    let response = client
        .get(parsed)
        .send()
        .map_err(|e| FaqError::UrlFetch(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FaqError::UrlFetch(format!("HTTP status {status}")));
    }

    let is_html = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("text/html"))
        .unwrap_or(false);

    let body = response
        .text()
        .map_err(|e| FaqError::UrlFetch(e.to_string()))?;
    if body.len() > MAX_URL_CONTENT_BYTES {
        return Err(FaqError::ContentTooLarge {
            size: body.len(),
            max: MAX_URL_CONTENT_BYTES,
        });
    }

    let text = if is_html || looks_like_html(&body) {
        strip_html(&body)
    } else {
        body
    };

    if text.trim().is_empty() {
        return Err(FaqError::EmptyContent);
    }
    Ok(text)
}

fn is_internal_address(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_private() || v4.is_loopback() || v4.is_link_local() || v4.is_unspecified()
        }
        IpAddr::V6(v6) => v6.is_loopback() || v6.is_unspecified(),
    }
}

fn looks_like_html(body: &str) -> bool {
    let head = body.trim_start().get(..256).unwrap_or(body.trim_start());
    let lower = head.to_ascii_lowercase();
    lower.starts_with("<!doctype html") || lower.starts_with("<html")
}

/// Reduce an HTML document to its visible text. Script and style bodies
/// are removed first, then remaining tags, then entity references that
/// commonly appear in support pages.
pub fn strip_html(html: &str) -> String {
    let script = regex::Regex::new(r"(?is)<(script|style)[^>]*>.*?</(script|style)>")
        .ok();
    let without_scripts = match &script {
        Some(re) => re.replace_all(html, " "),
        None => std::borrow::Cow::Borrowed(html),
    };

    let tags = regex::Regex::new(r"(?s)<[^>]+>").ok();
    let without_tags = match &tags {
        Some(re) => re.replace_all(&without_scripts, " "),
        None => without_scripts.clone(),
    };

    let decoded = without_tags
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'");

    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_supported_extensions() {
        assert_eq!(supported_extension("faq.txt").unwrap(), "txt");
        assert_eq!(supported_extension("FAQ.MD").unwrap(), "md");
        assert_eq!(supported_extension("data.csv").unwrap(), "csv");
    }

    #[test]
    fn rejects_unsupported_extensions() {
        assert!(matches!(
            supported_extension("faq.pdf"),
            Err(FaqError::UnsupportedFileType { extension }) if extension == "pdf"
        ));
        assert!(supported_extension("noext").is_err());
    }

    #[test]
    fn decodes_utf8_and_euc_kr() {
        assert_eq!(decode_text("환불 안내".as_bytes()).unwrap(), "환불 안내");
        // "안녕" in EUC-KR, invalid as UTF-8
        assert_eq!(decode_text(&[0xBE, 0xC8, 0xB3, 0xE7]).unwrap(), "안녕");
    }

    #[test]
    fn undecodable_bytes_are_rejected() {
        // 0xFF is not a valid EUC-KR lead byte
        assert!(matches!(
            decode_text(&[0x63, 0xFF, 0xFF]),
            Err(FaqError::Decode)
        ));
    }

    #[test]
    fn blocks_non_http_schemes_and_known_hosts() {
        assert!(matches!(
            fetch_url_content("file:///etc/passwd"),
            Err(FaqError::UrlBlocked { .. })
        ));
        assert!(matches!(
            fetch_url_content("http://localhost/faq"),
            Err(FaqError::UrlBlocked { .. })
        ));
        assert!(matches!(
            fetch_url_content("http://169.254.169.254/latest/meta-data"),
            Err(FaqError::UrlBlocked { .. })
        ));
    }

    #[test]
    fn strips_html_to_visible_text() {
        let html = r#"<!DOCTYPE html><html><head><style>p{color:red}</style>
            <script>alert("x")</script></head>
            <body><h1>배송 FAQ</h1><p>배송은 평일 기준 &nbsp;1~2일 소요됩니다.</p></body></html>"#;
        let text = strip_html(html);
        assert!(text.contains("배송 FAQ"));
        assert!(text.contains("1~2일 소요됩니다."));
        assert!(!text.contains("alert"));
        assert!(!text.contains("color:red"));
    }
}
