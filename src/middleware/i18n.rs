// src/middleware/i18n.rs

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

const SUPPORTED: [&str; 3] = ["ru", "en", "pt"];
const DEFAULT_LANG: &str = "ru";

// Extrator de idioma (Accept-Language). A oficina opera em russo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale(pub String);

impl Default for Locale {
    fn default() -> Self {
        Locale(DEFAULT_LANG.to_string())
    }
}

impl Locale {
    /// "pt-BR,en;q=0.8" -> primeiro idioma suportado, senão o padrão.
    pub fn from_header(value: &str) -> Self {
        accept_language::parse(value)
            .iter()
            .map(|tag| tag.split('-').next().unwrap_or(tag).to_lowercase())
            .find(|lang| SUPPORTED.contains(&lang.as_str()))
            .map(Locale)
            .unwrap_or_default()
    }
}

impl<S> FromRequestParts<S> for Locale
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let locale = parts
            .headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|value| value.to_str().ok())
            .map(Locale::from_header)
            .unwrap_or_default();

        Ok(locale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_first_supported_language() {
        assert_eq!(Locale::from_header("pt-BR,en;q=0.8").0, "pt");
        assert_eq!(Locale::from_header("de-DE,en;q=0.5").0, "en");
        assert_eq!(Locale::from_header("fr").0, "ru");
        assert_eq!(Locale::from_header("").0, "ru");
    }
}
