use crate::error::{Result, TwintailError};
use crate::serve::status::display_name;
use crate::serve::{ServeManager, ServiceDetail, ServiceSummary};

/// Handle `twintail status`.
pub fn handle_status(manager: &ServeManager, format: &str) -> Result<()> {
    let services = manager.get_serve_status()?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&services)?);
    } else {
        print!("{}", format_summaries(&services));
    }
    Ok(())
}

/// Handle `twintail show <name>`. Accepts the name with or without `svc:`.
pub fn handle_show(manager: &ServeManager, name: &str, format: &str) -> Result<()> {
    let name = display_name(name);
    let detail = manager
        .get_service_by_name(name)?
        .ok_or_else(|| TwintailError::ServiceNotFound(name.to_string()))?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&detail)?);
    } else {
        print!("{}", format_detail(&detail));
    }
    Ok(())
}

pub fn format_summaries(services: &[ServiceSummary]) -> String {
    if services.is_empty() {
        return "  No services advertised.\n".to_string();
    }

    let mut out = String::new();
    for service in services {
        out.push_str(&format!("● {}\n", service.name));
        if let Some(url) = &service.https_url {
            out.push_str(&format!("   HTTPS: {}\n", url));
        }
        if let Some(url) = &service.http_url {
            out.push_str(&format!("   HTTP:  {}\n", url));
        }
        if let Some(proxy) = &service.proxy {
            out.push_str(&format!("   Proxy: {}\n", proxy));
        }
    }
    out
}

pub fn format_detail(detail: &ServiceDetail) -> String {
    let mut out = format!("● {}\n", detail.name);
    if let Some(hostname) = &detail.hostname {
        out.push_str(&format!("   Hostname: {}\n", hostname));
    }
    if let Some(url) = &detail.url {
        out.push_str(&format!("   URL:      {}\n", url));
    }

    if detail.ports.is_empty() {
        out.push_str("   No endpoints.\n");
    } else {
        out.push_str("   Endpoints:\n");
        for port in &detail.ports {
            out.push_str(&format!(
                "     {}:{} -> {}\n",
                port.protocol, port.expose_port, port.destination
            ));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serve::PortEntry;

    #[test]
    fn test_format_summaries_empty() {
        assert_eq!(format_summaries(&[]), "  No services advertised.\n");
    }

    #[test]
    fn test_format_summaries_skips_missing_fields() {
        let services = vec![ServiceSummary {
            name: "db-proxy".to_string(),
            https_url: None,
            http_url: Some("http://db-proxy.example.ts.net".to_string()),
            proxy: None,
        }];
        let text = format_summaries(&services);
        assert!(text.contains("● db-proxy"));
        assert!(text.contains("HTTP:  http://db-proxy.example.ts.net"));
        assert!(!text.contains("HTTPS"));
        assert!(!text.contains("Proxy"));
    }

    #[test]
    fn test_format_detail_lists_endpoints() {
        let detail = ServiceDetail {
            name: "web-app".to_string(),
            hostname: Some("web-app.example.ts.net".to_string()),
            url: Some("https://web-app.example.ts.net".to_string()),
            ports: vec![PortEntry {
                protocol: "https".to_string(),
                expose_port: "443".to_string(),
                destination: "http://localhost:3000".to_string(),
            }],
        };
        let text = format_detail(&detail);
        assert!(text.contains("Hostname: web-app.example.ts.net"));
        assert!(text.contains("https:443 -> http://localhost:3000"));
    }
}
