//! Locale mapping for the remote catalog API
//!
//! The remote service accepts a fixed set of locale tags for product
//! descriptions. Merchant platforms report locales in varying shapes
//! (`en_US`, `en-us`, plain `de`); this module normalizes a merchant
//! locale and resolves it to a supported API locale, falling back to the
//! first supported tag with a matching language when the exact region is
//! not available.

use thiserror::Error;

/// Locale tags accepted by the remote catalog API
const SUPPORTED_API_LOCALES: &[&str] = &[
    "cs-CZ", "da-DK", "de-AT", "de-CH", "de-DE", "el-GR", "en-AU", "en-CA", "en-GB", "en-IE",
    "en-IN", "en-US", "es-AR", "es-CL", "es-CO", "es-ES", "es-MX", "fi-FI", "fr-BE", "fr-CA",
    "fr-CH", "fr-FR", "hu-HU", "id-ID", "it-IT", "ja-JP", "ko-KR", "ms-MY", "nb-NO", "nl-BE",
    "nl-NL", "pl-PL", "pt-BR", "pt-PT", "ro-RO", "ru-RU", "sk-SK", "sv-SE", "th-TH", "tl-PH",
    "tr-TR", "uk-UA", "vi-VN", "zh-CN", "zh-TW",
];

/// Failure to resolve a merchant locale to a supported API locale.
///
/// This is a merchant-visible misconfiguration, not a transient fault:
/// registration cannot proceed until the merchant locale changes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LocaleError {
    #[error("empty merchant locale")]
    Empty,

    #[error("no supported feed locale for '{0}'")]
    Unsupported(String),
}

/// Resolve a merchant locale tag to a locale accepted by the remote API.
///
/// Accepts `xx_YY`, `xx-YY`, and bare `xx` forms in any case. An exact
/// language+region match wins; otherwise the first supported locale with
/// the same language is used.
///
/// # Errors
///
/// Returns [`LocaleError`] when the tag is empty or no supported locale
/// shares its language.
pub fn api_locale_for(merchant_locale: &str) -> Result<String, LocaleError> {
    let normalized = normalize(merchant_locale);
    if normalized.is_empty() {
        return Err(LocaleError::Empty);
    }

    if let Some(exact) =
        SUPPORTED_API_LOCALES.iter().find(|candidate| candidate.as_bytes().eq_ignore_ascii_case(normalized.as_bytes()))
    {
        return Ok((*exact).to_string());
    }

    let language = normalized.split('-').next().unwrap_or_default();
    SUPPORTED_API_LOCALES
        .iter()
        .find(|candidate| {
            candidate.split('-').next().unwrap_or_default().eq_ignore_ascii_case(language)
        })
        .map(|candidate| (*candidate).to_string())
        .ok_or_else(|| LocaleError::Unsupported(merchant_locale.to_string()))
}

fn normalize(tag: &str) -> String {
    tag.trim().replace('_', "-")
}
