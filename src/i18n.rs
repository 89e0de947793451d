//! Message catalogs and language negotiation for the web console.

use crate::error::{Result, TwintailError};
use rust_embed::RustEmbed;
use std::collections::HashMap;

pub const DEFAULT_LANG: &str = "en";
pub const SUPPORTED_LANGUAGES: &[&str] = &["en", "ja"];

#[derive(RustEmbed)]
#[folder = "locales/"]
struct Locales;

/// Loaded translations, keyed by language then message key.
#[derive(Debug, Clone)]
pub struct I18n {
    translations: HashMap<String, HashMap<String, String>>,
    default_lang: String,
}

impl I18n {
    /// Load the catalogs compiled into the binary.
    pub fn load(default_lang: &str) -> Result<Self> {
        let files = Locales::iter().filter_map(|name| {
            Locales::get(&name).map(|file| (name.to_string(), file.data.into_owned()))
        });
        Self::from_files(files, default_lang)
    }

    /// Build from `(file name, contents)` pairs; only `*.json` files are read.
    pub fn from_files(
        files: impl IntoIterator<Item = (String, Vec<u8>)>,
        default_lang: &str,
    ) -> Result<Self> {
        let mut translations = HashMap::new();

        for (name, data) in files {
            let Some(lang) = name.strip_suffix(".json") else {
                continue;
            };
            let messages: HashMap<String, String> = serde_json::from_slice(&data).map_err(|e| {
                TwintailError::InvalidInput(format!("Invalid locale file {}: {}", name, e))
            })?;
            translations.insert(lang.to_string(), messages);
        }

        tracing::debug!(languages = translations.len(), "Loaded locale catalogs");

        Ok(Self {
            translations,
            default_lang: default_lang.to_string(),
        })
    }

    pub fn default_lang(&self) -> &str {
        &self.default_lang
    }

    /// Translate `key`, falling back to the default language, then the key itself.
    pub fn t<'a>(&'a self, lang: &str, key: &'a str) -> &'a str {
        [lang, self.default_lang.as_str()]
            .iter()
            .find_map(|l| self.translations.get(*l).and_then(|m| m.get(key)))
            .map(String::as_str)
            .unwrap_or(key)
    }

    pub fn translator<'a>(&'a self, lang: &'a str) -> Translator<'a> {
        Translator { i18n: self, lang }
    }
}

/// An [`I18n`] bound to one request language.
#[derive(Clone, Copy)]
pub struct Translator<'a> {
    i18n: &'a I18n,
    lang: &'a str,
}

impl<'a> Translator<'a> {
    pub fn t(&self, key: &'a str) -> &'a str {
        self.i18n.t(self.lang, key)
    }

    pub fn lang(&self) -> &'a str {
        self.lang
    }
}

pub fn is_supported(lang: &str) -> bool {
    SUPPORTED_LANGUAGES.contains(&lang)
}

/// Map unknown values to the default language.
pub fn normalize_lang(lang: &str) -> &'static str {
    SUPPORTED_LANGUAGES
        .iter()
        .copied()
        .find(|supported| *supported == lang)
        .unwrap_or(DEFAULT_LANG)
}

/// First supported language in an `Accept-Language` header, ignoring q-values.
pub fn parse_accept_language(header: &str) -> &'static str {
    header
        .split(',')
        .filter_map(|part| part.split(';').next())
        .map(str::trim)
        .find_map(|tag| {
            SUPPORTED_LANGUAGES
                .iter()
                .copied()
                .find(|lang| tag.starts_with(lang))
        })
        .unwrap_or(DEFAULT_LANG)
}

/// Native display name used on the settings page.
pub fn language_label(lang: &str) -> &'static str {
    match lang {
        "ja" => "日本語",
        _ => "English",
    }
}
