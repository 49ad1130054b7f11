//! Anti-forgery token extraction.

use std::fmt;
use std::sync::LazyLock;

use scraper::{Html, Selector};

static TOKEN_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"input[name="csrf_token"]"#).unwrap());

/// Anti-forgery token issued by the portal's index page.
///
/// `Debug` shows only a prefix so the token does not end up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct CsrfToken(String);

impl CsrfToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for CsrfToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix: String = self.0.chars().take(10).collect();
        write!(f, "CsrfToken({prefix}...)")
    }
}

/// Find the `csrf_token` hidden input in an index page.
///
/// Returns `None` if the input is missing or its value is empty.
pub fn extract_token(html: &str) -> Option<CsrfToken> {
    let document = Html::parse_document(html);
    document
        .select(&TOKEN_SELECTOR)
        .filter_map(|input| input.value().attr("value"))
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(CsrfToken::new)
}
