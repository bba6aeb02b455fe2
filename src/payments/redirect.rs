use axum::http::{header, HeaderMap};
use reqwest::Url;

use crate::{config::CheckoutConfig, payments::outcome::Outcome};

/// Base URL for buyer redirects: the `Referer` without its query string and
/// last path segment, else the `Origin`, else `fallback`. Embedding pages do
/// not always forward either header, so every step may come up empty.
pub fn resolve_base_url(headers: &HeaderMap, fallback: &str) -> String {
    let header_value = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    header_value(header::REFERER)
        .and_then(base_from_referer)
        .or_else(|| header_value(header::ORIGIN).and_then(base_from_origin))
        .unwrap_or_else(|| fallback.trim_end_matches('/').to_string())
}

fn parse_web_url(raw: &str) -> Option<Url> {
    let url = Url::parse(raw).ok()?;
    matches!(url.scheme(), "http" | "https").then_some(url)
}

fn base_from_referer(referer: &str) -> Option<String> {
    let mut url = parse_web_url(referer)?;
    url.set_query(None);
    url.set_fragment(None);
    {
        let mut segments = url.path_segments_mut().ok()?;
        segments.pop();
    }
    Some(url.as_str().trim_end_matches('/').to_string())
}

fn base_from_origin(origin: &str) -> Option<String> {
    let url = parse_web_url(origin)?;
    Some(url.origin().ascii_serialization())
}

/// Success and failure pages under one resolved base URL.
#[derive(Debug, Clone)]
pub struct Destinations {
    base: String,
    success_path: String,
    failure_path: String,
    redirect_type: String,
}

impl Destinations {
    pub fn new(base: impl Into<String>, config: &CheckoutConfig) -> Self {
        Self {
            base: base.into(),
            success_path: config.success_path.clone(),
            failure_path: config.failure_path.clone(),
            redirect_type: config.redirect_type.clone(),
        }
    }

    pub fn from_headers(headers: &HeaderMap, fallback_base: &str, config: &CheckoutConfig) -> Self {
        Self::new(resolve_base_url(headers, fallback_base), config)
    }

    pub fn success_url(&self, transaction_id: Option<&str>) -> String {
        let mut url = format!("{}{}?", self.base, self.success_path);
        if let Some(id) = transaction_id {
            url.push_str(&format!("transaction={}&", urlencoding::encode(id)));
        }
        url.push_str(&format!("type={}", urlencoding::encode(&self.redirect_type)));
        url
    }

    /// Failure page without a diagnostic, for the form's client-side fallback.
    pub fn failure_page(&self) -> String {
        format!("{}{}", self.base, self.failure_path)
    }

    pub fn failure_url(&self, diagnostic: &str) -> String {
        format!("{}?error={}", self.failure_page(), urlencoding::encode(diagnostic))
    }

    pub fn for_outcome(&self, outcome: &Outcome, transaction_id: Option<&str>) -> String {
        match outcome.diagnostic() {
            None => self.success_url(transaction_id),
            Some(diagnostic) => self.failure_url(diagnostic),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payments::outcome::{DECLINED_MESSAGE, FAILED_MESSAGE};
    use axum::http::HeaderValue;

    const FALLBACK: &str = "https://fallback.example.org/";

    fn headers(pairs: &[(header::HeaderName, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(name.clone(), HeaderValue::from_static(*value));
        }
        map
    }

    #[test]
    fn test_referer_strips_query_and_last_segment() {
        let map = headers(&[
            (header::REFERER, "https://kits.example.org/shop/kit?utm=abc#top"),
            (header::ORIGIN, "https://ignored.example.org"),
        ]);
        assert_eq!(resolve_base_url(&map, FALLBACK), "https://kits.example.org/shop");
    }

    #[test]
    fn test_referer_at_root() {
        let map = headers(&[(header::REFERER, "https://kits.example.org/")]);
        assert_eq!(resolve_base_url(&map, FALLBACK), "https://kits.example.org");

        let map = headers(&[(header::REFERER, "https://kits.example.org/kit")]);
        assert_eq!(resolve_base_url(&map, FALLBACK), "https://kits.example.org");
    }

    #[test]
    fn test_origin_fallback() {
        let map = headers(&[(header::ORIGIN, "https://origin.example.org")]);
        assert_eq!(resolve_base_url(&map, FALLBACK), "https://origin.example.org");

        let map = headers(&[
            (header::REFERER, "about:srcdoc"),
            (header::ORIGIN, "https://origin.example.org:8443"),
        ]);
        assert_eq!(resolve_base_url(&map, FALLBACK), "https://origin.example.org:8443");
    }

    #[test]
    fn test_configured_fallback() {
        assert_eq!(resolve_base_url(&HeaderMap::new(), FALLBACK), "https://fallback.example.org");

        let map = headers(&[(header::ORIGIN, "null")]);
        assert_eq!(resolve_base_url(&map, FALLBACK), "https://fallback.example.org");
    }

    #[test]
    fn test_destinations() {
        let destinations = Destinations::new("https://kits.example.org", &CheckoutConfig::default());

        assert_eq!(
            destinations.success_url(Some("T1")),
            "https://kits.example.org/payment-success?transaction=T1&type=kit"
        );
        assert_eq!(
            destinations.success_url(None),
            "https://kits.example.org/payment-success?type=kit"
        );
        assert_eq!(
            destinations.for_outcome(&Outcome::Declined(DECLINED_MESSAGE.to_string()), Some("T2")),
            "https://kits.example.org/payment-failed?error=Payment%20declined%20-%20Please%20check%20your%20card%20details"
        );
        assert_eq!(
            destinations.for_outcome(&Outcome::Ambiguous("boom".to_string()), None),
            format!("https://kits.example.org/payment-failed?error={}", urlencoding::encode(FAILED_MESSAGE))
        );
    }
}
