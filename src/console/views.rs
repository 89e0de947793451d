//! HTML pages of the console.

use crate::i18n::{self, Translator, SUPPORTED_LANGUAGES};
use crate::requests::{EndpointForm, Protocol, StoreServiceForm, UpdateEndpointForm, ValidationError};
use crate::serve::{ServiceDetail, ServiceSummary};
use axum::response::Html;
use url::{form_urlencoded, Url};

/// Escape text for HTML element content and quoted attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Percent-encode a service name for use as a single path segment.
pub fn path_segment(name: &str) -> String {
    // `push` would resolve dot segments instead of encoding them
    if name == "." || name == ".." {
        return name.replace('.', "%2E");
    }
    let Ok(mut url) = Url::parse("http://localhost/") else {
        return name.to_string();
    };
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().push(name);
    }
    url.path().trim_start_matches('/').to_string()
}

pub fn service_path(name: &str) -> String {
    format!("/services/{}", path_segment(name))
}

fn endpoint_link(name: &str, action: &str, protocol: &str, port: &str, destination: &str) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("protocol", protocol)
        .append_pair("port", port)
        .append_pair("destination", destination)
        .finish();
    format!("{}/endpoints/{}?{}", service_path(name), action, query)
}

pub fn validation_message(t: Translator<'_>, err: &ValidationError) -> String {
    format!("{}: {}", t.t(err.field().label_key()), t.t(err.message_key()))
}

fn layout(t: Translator<'_>, title: &str, body: &str) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html lang="{lang}">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} - Twintail</title>
    <link rel="stylesheet" href="/static/style.css">
</head>
<body>
    <header>
        <a class="brand" href="/">Twintail</a>
        <nav>
            <a href="/">{nav_services}</a>
            <a href="/services/new">{nav_new}</a>
            <a href="/settings">{nav_settings}</a>
        </nav>
    </header>
    <main>
        <h1>{title}</h1>
{body}
    </main>
    <script src="/static/protocol-port-sync.js"></script>
</body>
</html>
"#,
        lang = t.lang(),
        title = escape(title),
        nav_services = t.t("nav.services"),
        nav_new = t.t("nav.new_service"),
        nav_settings = t.t("nav.settings"),
        body = body,
    ))
}

fn error_banner(message: Option<&str>) -> String {
    message
        .map(|m| format!(r#"        <div class="alert alert-error">{}</div>"#, escape(m)))
        .unwrap_or_default()
}

fn optional_link(url: Option<&str>) -> String {
    match url {
        Some(url) => format!(
            r#"<a href="{0}" target="_blank" rel="noopener">{0}</a>"#,
            escape(url)
        ),
        None => "-".to_string(),
    }
}

fn protocol_select(t: Translator<'_>, selected: &str) -> String {
    let options: String = Protocol::ALL
        .iter()
        .map(|p| {
            format!(
                r#"<option value="{0}"{1}>{0}</option>"#,
                p.as_str(),
                if p.as_str() == selected { " selected" } else { "" }
            )
        })
        .collect();
    format!(
        r#"<label>{}<select name="protocol">{}</select></label>"#,
        t.t("form.protocol"),
        options
    )
}

fn text_input(label: &str, name: &str, value: &str, readonly: bool) -> String {
    format!(
        r#"<label>{}<input type="text" name="{}" value="{}"{}></label>"#,
        label,
        name,
        escape(value),
        if readonly { " readonly" } else { " required" }
    )
}

fn hidden(name: &str, value: &str) -> String {
    format!(r#"<input type="hidden" name="{}" value="{}">"#, name, escape(value))
}

pub fn index(t: Translator<'_>, services: &[ServiceSummary]) -> Html<String> {
    let body = if services.is_empty() {
        format!(
            r#"        <p class="empty">{}</p>
        <a class="button" href="/services/new">{}</a>"#,
            t.t("services.empty"),
            t.t("services.new")
        )
    } else {
        let rows: String = services
            .iter()
            .map(|svc| {
                format!(
                    r#"
            <tr>
                <td><a href="{}">{}</a></td>
                <td>{}</td>
                <td>{}</td>
                <td>{}</td>
            </tr>"#,
                    service_path(&svc.name),
                    escape(&svc.name),
                    optional_link(svc.https_url.as_deref()),
                    optional_link(svc.http_url.as_deref()),
                    svc.proxy.as_deref().map(escape).unwrap_or_else(|| "-".into()),
                )
            })
            .collect();
        format!(
            r#"        <table>
            <thead><tr><th>{}</th><th>HTTPS</th><th>HTTP</th><th>{}</th></tr></thead>
            <tbody>{}
            </tbody>
        </table>
        <a class="button" href="/services/new">{}</a>"#,
            t.t("services.name"),
            t.t("services.proxy"),
            rows,
            t.t("services.new")
        )
    };
    layout(t, t.t("services.title"), &body)
}

pub fn new_service(t: Translator<'_>, form: &StoreServiceForm, error: Option<&str>) -> Html<String> {
    let body = format!(
        r#"{error}
        <form method="post" action="/services/new">
            {name}
            {protocol}
            {port}
            {destination}
            <button type="submit">{submit}</button>
            <a href="/">{cancel}</a>
        </form>"#,
        error = error_banner(error),
        name = text_input(t.t("form.service_name"), "service_name", &form.service_name, false),
        protocol = protocol_select(t, &form.protocol),
        port = text_input(t.t("form.expose_port"), "expose_port", &form.expose_port, false),
        destination = text_input(t.t("form.destination"), "destination", &form.destination, false),
        submit = t.t("form.submit.create"),
        cancel = t.t("form.cancel"),
    );
    layout(t, t.t("service.new.title"), &body)
}

pub fn show_service(t: Translator<'_>, detail: &ServiceDetail) -> Html<String> {
    let endpoints = if detail.ports.is_empty() {
        format!(r#"<p class="empty">{}</p>"#, t.t("service.no_endpoints"))
    } else {
        let rows: String = detail
            .ports
            .iter()
            .map(|port| {
                format!(
                    r#"
                <tr>
                    <td>{}</td><td>{}</td><td>{}</td>
                    <td><a href="{}">{}</a> <a href="{}">{}</a></td>
                </tr>"#,
                    escape(&port.protocol),
                    escape(&port.expose_port),
                    escape(&port.destination),
                    escape(&endpoint_link(&detail.name, "edit", &port.protocol, &port.expose_port, &port.destination)),
                    t.t("endpoint.edit"),
                    escape(&endpoint_link(&detail.name, "delete", &port.protocol, &port.expose_port, &port.destination)),
                    t.t("endpoint.delete"),
                )
            })
            .collect();
        format!(
            r#"<table>
            <thead><tr><th>{}</th><th>{}</th><th>{}</th><th></th></tr></thead>
            <tbody>{}
            </tbody>
        </table>"#,
            t.t("endpoint.protocol"),
            t.t("endpoint.port"),
            t.t("endpoint.destination"),
            rows
        )
    };

    let body = format!(
        r#"        <dl>
            <dt>{hostname_label}</dt><dd>{hostname}</dd>
            <dt>URL</dt><dd>{url}</dd>
        </dl>
        <h2>{endpoints_label}</h2>
        {endpoints}
        <p>
            <a class="button" href="{path}/endpoints/new">{add}</a>
            <a class="button danger" href="{path}/delete">{delete}</a>
            <a href="/">{back}</a>
        </p>"#,
        hostname_label = t.t("service.hostname"),
        hostname = detail.hostname.as_deref().map(escape).unwrap_or_else(|| "-".into()),
        url = optional_link(detail.url.as_deref()),
        endpoints_label = t.t("service.endpoints"),
        endpoints = endpoints,
        path = service_path(&detail.name),
        add = t.t("endpoint.add"),
        delete = t.t("service.delete"),
        back = t.t("service.back"),
    );
    layout(t, &detail.name, &body)
}

pub fn confirm_delete_service(t: Translator<'_>, detail: &ServiceDetail) -> Html<String> {
    let body = format!(
        r#"        <p>{message} <strong>{name}</strong></p>
        <form method="post" action="{path}/delete">
            <button type="submit" class="danger">{submit}</button>
            <a href="{path}">{cancel}</a>
        </form>"#,
        message = t.t("service.delete.confirm"),
        name = escape(&detail.name),
        path = service_path(&detail.name),
        submit = t.t("form.submit.delete"),
        cancel = t.t("form.cancel"),
    );
    layout(t, t.t("service.delete.title"), &body)
}

pub fn new_endpoint(
    t: Translator<'_>,
    service_name: &str,
    form: &EndpointForm,
    error: Option<&str>,
) -> Html<String> {
    let body = format!(
        r#"{error}
        <p>{service}</p>
        <form method="post" action="{path}/endpoints/new">
            {protocol}
            {port}
            {destination}
            <button type="submit">{submit}</button>
            <a href="{path}">{cancel}</a>
        </form>"#,
        error = error_banner(error),
        service = escape(service_name),
        path = service_path(service_name),
        protocol = protocol_select(t, &form.protocol),
        port = text_input(t.t("form.expose_port"), "expose_port", &form.expose_port, false),
        destination = text_input(t.t("form.destination"), "destination", &form.destination, false),
        submit = t.t("form.submit.add"),
        cancel = t.t("form.cancel"),
    );
    layout(t, t.t("endpoint.new.title"), &body)
}

/// Edit form. `partial` marks a failed update that already removed the old
/// destination.
pub fn edit_endpoint(
    t: Translator<'_>,
    service_name: &str,
    form: &UpdateEndpointForm,
    error: Option<&str>,
    partial: bool,
) -> Html<String> {
    let warning = if partial {
        format!(
            r#"        <div class="alert alert-warning">{} <a href="{}">{}</a></div>"#,
            t.t("endpoint.partial_update"),
            service_path(service_name),
            t.t("service.endpoints"),
        )
    } else {
        String::new()
    };

    let body = format!(
        r#"{warning}
{error}
        <p>{service}</p>
        <form method="post" action="{path}/endpoints/edit">
            {protocol}
            {port}
            {old}
            {new}
            <button type="submit">{submit}</button>
            <a href="{path}">{cancel}</a>
        </form>"#,
        warning = warning,
        error = error_banner(error),
        service = escape(service_name),
        path = service_path(service_name),
        protocol = text_input(t.t("form.protocol"), "protocol", &form.protocol, true),
        port = text_input(t.t("form.expose_port"), "expose_port", &form.expose_port, true),
        old = text_input(t.t("form.old_destination"), "old_destination", &form.old_destination, true),
        new = text_input(t.t("form.new_destination"), "new_destination", &form.new_destination, false),
        submit = t.t("form.submit.save"),
        cancel = t.t("form.cancel"),
    );
    layout(t, t.t("endpoint.edit.title"), &body)
}

pub fn confirm_delete_endpoint(t: Translator<'_>, service_name: &str, form: &EndpointForm) -> Html<String> {
    let body = format!(
        r#"        <p>{message}</p>
        <dl>
            <dt>{protocol_label}</dt><dd>{protocol}</dd>
            <dt>{port_label}</dt><dd>{port}</dd>
            <dt>{destination_label}</dt><dd>{destination}</dd>
        </dl>
        <form method="post" action="{path}/endpoints/delete">
            {hidden}
            <button type="submit" class="danger">{submit}</button>
            <a href="{path}">{cancel}</a>
        </form>"#,
        message = t.t("endpoint.delete.confirm"),
        protocol_label = t.t("endpoint.protocol"),
        protocol = escape(&form.protocol),
        port_label = t.t("endpoint.port"),
        port = escape(&form.expose_port),
        destination_label = t.t("endpoint.destination"),
        destination = escape(&form.destination),
        path = service_path(service_name),
        hidden = [
            hidden("protocol", &form.protocol),
            hidden("expose_port", &form.expose_port),
            hidden("destination", &form.destination),
        ]
        .concat(),
        submit = t.t("form.submit.delete"),
        cancel = t.t("form.cancel"),
    );
    layout(t, t.t("endpoint.delete.title"), &body)
}

pub fn settings(t: Translator<'_>) -> Html<String> {
    let options: String = SUPPORTED_LANGUAGES
        .iter()
        .map(|lang| {
            format!(
                r#"<option value="{}"{}>{}</option>"#,
                lang,
                if *lang == t.lang() { " selected" } else { "" },
                i18n::language_label(lang)
            )
        })
        .collect();
    let body = format!(
        r#"        <form method="post" action="/settings">
            <label>{label}<select name="lang">{options}</select></label>
            <button type="submit">{submit}</button>
        </form>"#,
        label = t.t("settings.language"),
        options = options,
        submit = t.t("form.submit.save"),
    );
    layout(t, t.t("settings.title"), &body)
}

pub fn error_page(t: Translator<'_>, message: &str) -> Html<String> {
    let body = format!(
        r#"        <div class="alert alert-error">{}</div>
        <a href="/">{}</a>"#,
        escape(message),
        t.t("service.back")
    );
    layout(t, t.t("error.title"), &body)
}

pub fn not_found(t: Translator<'_>) -> Html<String> {
    error_page(t, t.t("error.not_found"))
}

pub fn not_installed(t: Translator<'_>) -> Html<String> {
    let body = format!(
        r#"        <p>{}</p>
        <p><a href="https://tailscale.com/download" target="_blank" rel="noopener">tailscale.com/download</a></p>"#,
        t.t("not_installed.message")
    );
    layout(t, t.t("not_installed.title"), &body)
}
