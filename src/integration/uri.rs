//! Upstream URI templates with `{token}` placeholders.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
enum UriPart {
    Text(String),
    Token(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UriTemplateError {
    #[error("unclosed `{{` in uri template `{0}`")]
    Unclosed(String),

    #[error("empty or nested token in uri template `{0}`")]
    BadToken(String),

    #[error("stray `}}` in uri template `{0}`")]
    StrayBrace(String),
}

/// Substitution failed because a token had no value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("uri token `{0}` has no value")]
pub struct UnresolvedToken(pub String);

/// A parsed upstream URI such as `https://ledger/transactions/{id}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriTemplate {
    raw: String,
    parts: Vec<UriPart>,
}

impl UriTemplate {
    pub fn parse(raw: &str) -> Result<Self, UriTemplateError> {
        let mut parts = Vec::new();
        let mut rest = raw;

        while let Some(open) = rest.find(['{', '}']) {
            if rest[open..].starts_with('}') {
                return Err(UriTemplateError::StrayBrace(raw.to_string()));
            }
            if open > 0 {
                parts.push(UriPart::Text(rest[..open].to_string()));
            }
            let after = &rest[open + 1..];
            let close = after
                .find('}')
                .ok_or_else(|| UriTemplateError::Unclosed(raw.to_string()))?;
            let name = &after[..close];
            if name.is_empty() || name.contains('{') {
                return Err(UriTemplateError::BadToken(raw.to_string()));
            }
            parts.push(UriPart::Token(name.to_string()));
            rest = &after[close + 1..];
        }
        if !rest.is_empty() {
            parts.push(UriPart::Text(rest.to_string()));
        }

        Ok(Self {
            raw: raw.to_string(),
            parts,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().filter_map(|p| match p {
            UriPart::Token(name) => Some(name.as_str()),
            UriPart::Text(_) => None,
        })
    }

    pub fn is_fixed(&self) -> bool {
        self.tokens().next().is_none()
    }

    /// Name of the token the template ends with, if it ends with one.
    pub fn trailing_token(&self) -> Option<&str> {
        match self.parts.last() {
            Some(UriPart::Token(name)) => Some(name),
            _ => None,
        }
    }

    /// The template without its trailing token.
    pub fn without_trailing_token(&self) -> UriTemplate {
        let mut parts = self.parts.clone();
        if matches!(parts.last(), Some(UriPart::Token(_))) {
            parts.pop();
        }
        let raw = render(&parts);
        UriTemplate { raw, parts }
    }

    /// Substitute every token. Fails closed: no partially expanded URI is
    /// ever returned.
    pub fn expand<'a, F>(&self, lookup: F) -> Result<String, UnresolvedToken>
    where
        F: Fn(&str) -> Option<&'a str>,
    {
        let mut out = String::with_capacity(self.raw.len());
        for part in &self.parts {
            match part {
                UriPart::Text(text) => out.push_str(text),
                UriPart::Token(name) => {
                    let value = lookup(name).ok_or_else(|| UnresolvedToken(name.clone()))?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }
}

impl std::fmt::Display for UriTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

fn render(parts: &[UriPart]) -> String {
    parts
        .iter()
        .map(|p| match p {
            UriPart::Text(text) => text.clone(),
            UriPart::Token(name) => format!("{{{}}}", name),
        })
        .collect()
}
