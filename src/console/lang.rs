//! Request language: `lang` cookie first, then `Accept-Language`, then the
//! configured default.

use super::server::AppState;
use crate::i18n;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use std::convert::Infallible;

pub const LANG_COOKIE: &str = "lang";
const COOKIE_MAX_AGE_SECS: u64 = 365 * 24 * 60 * 60;

/// Negotiated language of the current request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lang(pub &'static str);

#[async_trait]
impl FromRequestParts<AppState> for Lang {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(Lang(negotiate(&parts.headers, state.i18n.default_lang())))
    }
}

pub fn negotiate(headers: &HeaderMap, default_lang: &str) -> &'static str {
    if let Some(lang) = cookie_value(headers, LANG_COOKIE).filter(|v| !v.is_empty()) {
        return i18n::normalize_lang(lang);
    }
    match headers
        .get(header::ACCEPT_LANGUAGE)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.trim().is_empty())
    {
        Some(accept) => i18n::parse_accept_language(accept),
        None => i18n::normalize_lang(default_lang),
    }
}

pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim())
}

/// `Set-Cookie` value persisting the language for a year.
pub fn lang_cookie(lang: &str) -> String {
    format!(
        "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
        LANG_COOKIE, lang, COOKIE_MAX_AGE_SECS
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(header::HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn test_cookie_wins_over_accept_language() {
        let map = headers(&[
            (header::COOKIE, "theme=dark; lang=ja"),
            (header::ACCEPT_LANGUAGE, "en-US"),
        ]);
        assert_eq!(negotiate(&map, "en"), "ja");
    }

    #[test]
    fn test_unknown_cookie_value_normalized() {
        let map = headers(&[(header::COOKIE, "lang=xx")]);
        assert_eq!(negotiate(&map, "ja"), "en");
    }

    #[test]
    fn test_accept_language_then_default() {
        let map = headers(&[(header::ACCEPT_LANGUAGE, "ja-JP,ja;q=0.9")]);
        assert_eq!(negotiate(&map, "en"), "ja");
        assert_eq!(negotiate(&HeaderMap::new(), "ja"), "ja");
        assert_eq!(negotiate(&HeaderMap::new(), "en"), "en");
    }

    #[test]
    fn test_lang_cookie_attributes() {
        assert_eq!(
            lang_cookie("ja"),
            "lang=ja; Path=/; Max-Age=31536000; HttpOnly; SameSite=Lax"
        );
    }
}
