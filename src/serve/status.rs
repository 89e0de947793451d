//! `tailscale serve status --json` document and the read models derived from it.
//!
//! Raw mappings deserialize into `BTreeMap`, so web entries and handlers are
//! always visited in lexicographic key order. That order decides which proxy
//! counts as "first" and the order of [`ServiceDetail::ports`].

use crate::error::{Result, TwintailError};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Prefix the daemon puts in front of every service name.
pub const SERVICE_PREFIX: &str = "svc:";

const HTTPS_PORT: &str = "443";
const HTTP_DEFAULT_PORT: &str = "80";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServeStatus {
    #[serde(rename = "Services", default, deserialize_with = "null_values_as_default")]
    pub services: Option<BTreeMap<String, ServiceRecord>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceRecord {
    #[serde(rename = "TCP", default, deserialize_with = "null_values_as_default")]
    pub tcp: Option<BTreeMap<String, TcpEntry>>,
    #[serde(rename = "Web", default, deserialize_with = "null_values_as_default")]
    pub web: Option<BTreeMap<String, WebEntry>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TcpEntry {
    #[serde(rename = "HTTP", default)]
    pub http: bool,
    #[serde(rename = "HTTPS", default)]
    pub https: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebEntry {
    #[serde(rename = "Handlers", default, deserialize_with = "null_values_as_default")]
    pub handlers: Option<BTreeMap<String, Handler>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Handler {
    #[serde(rename = "Proxy", default)]
    pub proxy: Option<String>,
}

/// A `null` map value decodes to the value's default, so a service or entry
/// reported as `null` is still listed.
fn null_values_as_default<'de, D, T>(
    deserializer: D,
) -> std::result::Result<Option<BTreeMap<String, T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    let raw: Option<BTreeMap<String, Option<T>>> = Option::deserialize(deserializer)?;
    Ok(raw.map(|map| {
        map.into_iter()
            .map(|(key, value)| (key, value.unwrap_or_default()))
            .collect()
    }))
}

/// One row of the service list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ServiceSummary {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub https_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ServiceDetail {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub ports: Vec<PortEntry>,
}

/// A single routed endpoint of a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortEntry {
    pub protocol: String,
    pub expose_port: String,
    pub destination: String,
}

impl WebEntry {
    fn proxies(&self) -> impl Iterator<Item = &str> {
        self.handlers
            .iter()
            .flat_map(|handlers| handlers.values())
            .filter_map(|handler| handler.proxy.as_deref())
            .filter(|proxy| !proxy.is_empty())
    }
}

impl ServiceRecord {
    fn web_entries(&self) -> impl Iterator<Item = (&str, &WebEntry)> {
        self.web
            .iter()
            .flat_map(|web| web.iter())
            .map(|(key, entry)| (key.as_str(), entry))
    }

    /// Web entries whose key splits into exactly `host:port`.
    fn bindings(&self) -> impl Iterator<Item = (&str, &str, &WebEntry)> {
        self.web_entries()
            .filter_map(|(key, entry)| split_host_port(key).map(|(host, port)| (host, port, entry)))
    }

    fn urls(&self) -> (Option<String>, Option<String>) {
        let mut https = None;
        let mut http = None;
        for (host, port, _) in self.bindings() {
            if port == HTTPS_PORT {
                https.get_or_insert_with(|| format!("https://{}", host));
            } else {
                http.get_or_insert_with(|| http_url(host, port));
            }
        }
        (https, http)
    }
}

/// Parse the raw bytes printed by `tailscale serve status --json`.
pub fn parse_status(bytes: &[u8]) -> Result<ServeStatus> {
    serde_json::from_slice(bytes).map_err(TwintailError::Parse)
}

/// Service key with exactly one leading `svc:` removed.
pub fn display_name(key: &str) -> &str {
    key.strip_prefix(SERVICE_PREFIX).unwrap_or(key)
}

/// Daemon-side key for a display name.
pub fn service_key(name: &str) -> String {
    format!("{}{}", SERVICE_PREFIX, name)
}

/// Split a web-entry key into host and port; `None` unless there is exactly
/// one colon.
pub fn split_host_port(key: &str) -> Option<(&str, &str)> {
    let mut parts = key.split(':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(host), Some(port), None) => Some((host, port)),
        _ => None,
    }
}

fn http_url(host: &str, port: &str) -> String {
    if port == HTTP_DEFAULT_PORT {
        format!("http://{}", host)
    } else {
        format!("http://{}:{}", host, port)
    }
}

pub fn summarize(key: &str, record: &ServiceRecord) -> ServiceSummary {
    let (https_url, http_url) = record.urls();
    let proxy = record
        .web_entries()
        .flat_map(|(_, entry)| entry.proxies())
        .next()
        .map(str::to_string);

    ServiceSummary {
        name: display_name(key).to_string(),
        https_url,
        http_url,
        proxy,
    }
}

pub fn detail(key: &str, record: &ServiceRecord) -> ServiceDetail {
    let (https_url, http_url) = record.urls();
    let hostname = record.bindings().next().map(|(host, _, _)| host.to_string());

    let ports = record
        .bindings()
        .flat_map(|(_, port, entry)| {
            entry.proxies().map(move |proxy| PortEntry {
                protocol: if port == HTTPS_PORT { "https" } else { "http" }.to_string(),
                expose_port: port.to_string(),
                destination: proxy.to_string(),
            })
        })
        .collect();

    ServiceDetail {
        name: display_name(key).to_string(),
        hostname,
        url: https_url.or(http_url),
        ports,
    }
}

/// Every service in the document, sorted by display name.
pub fn summarize_services(status: &ServeStatus) -> Vec<ServiceSummary> {
    let mut summaries: Vec<ServiceSummary> = status
        .services
        .iter()
        .flat_map(|services| services.iter())
        .map(|(key, record)| summarize(key, record))
        .collect();
    summaries.sort_by(|a, b| a.name.cmp(&b.name));
    summaries
}

pub fn find_service(status: &ServeStatus, name: &str) -> Option<ServiceDetail> {
    let key = service_key(name);
    status
        .services
        .as_ref()
        .and_then(|services| services.get(&key))
        .map(|record| detail(&key, record))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(json: &str) -> ServeStatus {
        parse_status(json.as_bytes()).unwrap()
    }

    #[test]
    fn test_display_name_strips_one_prefix() {
        assert_eq!(display_name("svc:web-app"), "web-app");
        assert_eq!(display_name("web-app"), "web-app");
        assert_eq!(display_name("svc:svc:nested"), "svc:nested");
    }

    #[test]
    fn test_split_host_port() {
        assert_eq!(split_host_port("example.com:443"), Some(("example.com", "443")));
        assert_eq!(split_host_port("example.com"), None);
        assert_eq!(split_host_port("a:b:c"), None);
    }

    #[test]
    fn test_absent_null_and_empty_services() {
        for doc in ["{}", r#"{"Services": null}"#, r#"{"Services": {}}"#] {
            assert!(summarize_services(&status(doc)).is_empty(), "doc: {}", doc);
        }
    }

    #[test]
    fn test_invalid_shape_is_parse_error() {
        assert!(matches!(parse_status(b"invalid json"), Err(TwintailError::Parse(_))));
        assert!(matches!(
            parse_status(br#"{"Services": []}"#),
            Err(TwintailError::Parse(_))
        ));
    }

    #[test]
    fn test_https_summary_and_detail() {
        let doc = status(
            r#"{"Services": {"svc:web-app": {"Web": {"example.com:443": {
                "Handlers": {"/": {"Proxy": "http://localhost:3000"}}}}}}}"#,
        );

        let summaries = summarize_services(&doc);
        assert_eq!(
            summaries,
            vec![ServiceSummary {
                name: "web-app".into(),
                https_url: Some("https://example.com".into()),
                http_url: None,
                proxy: Some("http://localhost:3000".into()),
            }]
        );

        let detail = find_service(&doc, "web-app").unwrap();
        assert_eq!(detail.hostname.as_deref(), Some("example.com"));
        assert_eq!(detail.url.as_deref(), Some("https://example.com"));
        assert_eq!(
            detail.ports,
            vec![PortEntry {
                protocol: "https".into(),
                expose_port: "443".into(),
                destination: "http://localhost:3000".into(),
            }]
        );
    }

    #[test]
    fn test_http_urls_omit_default_port_only() {
        let doc = status(
            r#"{"Services": {
                "svc:plain": {"Web": {"example.com:80": {"Handlers": {"/": {"Proxy": "http://localhost:3000"}}}}},
                "svc:custom": {"Web": {"example.com:8080": {"Handlers": {"/": {"Proxy": "http://localhost:3000"}}}}}
            }}"#,
        );

        let plain = find_service(&doc, "plain").unwrap();
        assert_eq!(plain.url.as_deref(), Some("http://example.com"));
        assert_eq!(plain.ports[0].protocol, "http");

        let custom = find_service(&doc, "custom").unwrap();
        assert_eq!(custom.url.as_deref(), Some("http://example.com:8080"));
        assert_eq!(custom.ports[0].expose_port, "8080");

        let summaries = summarize_services(&doc);
        assert_eq!(summaries[0].name, "custom");
        assert_eq!(summaries[0].http_url.as_deref(), Some("http://example.com:8080"));
        assert_eq!(summaries[0].https_url, None);
    }

    #[test]
    fn test_https_wins_over_http_in_detail() {
        let doc = status(
            r#"{"Services": {"svc:both": {"Web": {
                "example.com:443": {"Handlers": {"/": {"Proxy": "http://localhost:3000"}}},
                "example.com:8080": {"Handlers": {"/": {"Proxy": "http://localhost:4000"}}}
            }}}}"#,
        );

        let detail = find_service(&doc, "both").unwrap();
        assert_eq!(detail.url.as_deref(), Some("https://example.com"));
        assert_eq!(detail.ports.len(), 2);
        assert_eq!(detail.ports[0].expose_port, "443");
        assert_eq!(detail.ports[1].destination, "http://localhost:4000");

        let summary = &summarize_services(&doc)[0];
        assert_eq!(summary.https_url.as_deref(), Some("https://example.com"));
        assert_eq!(summary.http_url.as_deref(), Some("http://example.com:8080"));
        assert_eq!(summary.proxy.as_deref(), Some("http://localhost:3000"));
    }

    #[test]
    fn test_malformed_key_still_emits_service() {
        let doc = status(
            r#"{"Services": {"svc:invalid-host": {"Web": {"example.com": {
                "Handlers": {"/": {"Proxy": "http://localhost:3000"}}}}}}}"#,
        );

        let summaries = summarize_services(&doc);
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].name, "invalid-host");
        assert_eq!(summaries[0].https_url, None);
        assert_eq!(summaries[0].http_url, None);

        let detail = find_service(&doc, "invalid-host").unwrap();
        assert_eq!(detail.hostname, None);
        assert_eq!(detail.url, None);
        assert!(detail.ports.is_empty());
    }

    #[test]
    fn test_service_without_web_entries() {
        let doc = status(r#"{"Services": {"svc:empty-web": {"Web": {}}, "svc:tcp-only": {"TCP": {"443": {"HTTPS": true}}}}}"#);
        let summaries = summarize_services(&doc);
        assert_eq!(summaries.len(), 2);
        for summary in &summaries {
            assert_eq!(summary.https_url, None);
            assert_eq!(summary.http_url, None);
            assert_eq!(summary.proxy, None);
        }
    }

    #[test]
    fn test_empty_handlers_and_empty_proxy_are_skipped() {
        let doc = status(
            r#"{"Services": {"svc:no-handlers": {"Web": {
                "example.com:443": {"Handlers": {"/": {"Proxy": ""}, "/api": {}}}
            }}}}"#,
        );
        assert_eq!(summarize_services(&doc)[0].proxy, None);
        let detail = find_service(&doc, "no-handlers").unwrap();
        assert!(detail.ports.is_empty());
        assert_eq!(detail.url.as_deref(), Some("https://example.com"));
    }

    #[test]
    fn test_first_proxy_is_lexicographic() {
        let doc = status(
            r#"{"Services": {"svc:multi": {"Web": {"example.com:443": {"Handlers": {
                "/z": {"Proxy": "http://localhost:9000"},
                "/a": {"Proxy": "http://localhost:1000"}
            }}}}}}"#,
        );
        assert_eq!(
            summarize_services(&doc)[0].proxy.as_deref(),
            Some("http://localhost:1000")
        );
    }

    #[test]
    fn test_find_service_requires_prefixed_key() {
        let doc = status(r#"{"Services": {"bare": {"Web": {}}}}"#);
        assert!(find_service(&doc, "bare").is_none());
        assert!(find_service(&doc, "missing").is_none());
        // Unprefixed keys are still listed under their own name
        assert_eq!(summarize_services(&doc)[0].name, "bare");
    }

    #[test]
    fn test_null_values_decode_as_empty() {
        let doc = status(r#"{"Services": {"svc:x": null}}"#);
        let summaries = summarize_services(&doc);
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].name, "x");
        assert_eq!(summaries[0].https_url, None);
        assert!(find_service(&doc, "x").unwrap().ports.is_empty());

        let doc = status(
            r#"{"Services": {"svc:y": {"TCP": {"443": null}, "Web": {
                "y.example.ts.net:443": {"Handlers": {"/": null, "/api": {"Proxy": "http://localhost:8080"}}},
                "y.example.ts.net:80": null
            }}}}"#,
        );
        let detail = find_service(&doc, "y").unwrap();
        assert_eq!(detail.hostname.as_deref(), Some("y.example.ts.net"));
        assert_eq!(detail.ports.len(), 1);
        assert_eq!(detail.ports[0].destination, "http://localhost:8080");
        assert_eq!(summarize_services(&doc)[0].http_url.as_deref(), Some("http://y.example.ts.net"));
    }
}
