//! Token substitution.
//!
//! Tokens are literal markers (`%SITEURL%` style) replaced in a single
//! left-to-right pass after sanitization. Replacement output is never
//! rescanned, so a token value containing another token's marker stays
//! inert.

/// One literal token and its replacement value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomToken {
    /// Marker text matched verbatim, e.g. `%SITEURL%`.
    pub marker: String,
    /// Replacement HTML. Callers sanitize this before registration.
    pub replacement: String,
}

impl CustomToken {
    pub fn new(marker: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
            replacement: replacement.into(),
        }
    }
}

/// Ordered token registry. The first registration of a marker wins; later
/// registrations of the same marker are dropped.
#[derive(Debug, Default)]
pub struct TokenSet {
    tokens: Vec<CustomToken>,
}

impl TokenSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, token: CustomToken) {
        if token.marker.is_empty() {
            return;
        }
        if self.tokens.iter().any(|existing| existing.marker == token.marker) {
            return;
        }
        self.tokens.push(token);
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Substitute every registered token in one pass. At each position the
    /// earliest-registered matching token applies; matches never overlap.
    pub fn apply(&self, text: &str) -> String {
        if self.tokens.is_empty() {
            return text.to_string();
        }

        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        'scan: while !rest.is_empty() {
            for token in &self.tokens {
                if rest.starts_with(&token.marker) {
                    out.push_str(&token.replacement);
                    rest = &rest[token.marker.len()..];
                    continue 'scan;
                }
            }
            let mut chars = rest.chars();
            match chars.next() {
                Some(ch) => {
                    out.push(ch);
                    rest = chars.as_str();
                }
                None => break,
            }
        }
        out
    }
}
