//! Path template parsing and matching.
//!
//! # Responsibilities
//! - Parse `/ledger/transaction/{id}` style templates into typed segments
//! - Match a request path and capture named segments
//! - Rank templates by specificity for conflict resolution
//!
//! # Design Decisions
//! - Literal segments are case-sensitive
//! - `{name}` matches exactly one non-empty segment
//! - `{name+}` matches the non-empty remainder verbatim, slashes included
//! - A single trailing slash on the request path is tolerated
//! - No regex to guarantee O(n) matching

use thiserror::Error;

/// One `/`-separated piece of a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Param(String),
    Greedy(String),
}

impl Segment {
    /// Specificity at a single position. Higher wins.
    pub fn rank(&self) -> u8 {
        match self {
            Segment::Literal(_) => 2,
            Segment::Param(_) => 1,
            Segment::Greedy(_) => 0,
        }
    }

    /// Capture name for parameter segments.
    pub fn param_name(&self) -> Option<&str> {
        match self {
            Segment::Literal(_) => None,
            Segment::Param(name) | Segment::Greedy(name) => Some(name),
        }
    }
}

/// Errors raised while parsing a template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("path template `{0}` must start with '/'")]
    MissingLeadingSlash(String),

    #[error("path template `{0}` contains an empty segment")]
    EmptySegment(String),

    #[error("malformed segment `{segment}` in path template `{template}`")]
    MalformedSegment { template: String, segment: String },

    #[error("greedy segment must be the last segment of `{0}`")]
    GreedyNotLast(String),

    #[error("parameter `{name}` appears twice in `{template}`")]
    DuplicateParam { template: String, name: String },
}

/// Named values captured while matching, in template order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Captures(Vec<(String, String)>);

impl Captures {
    /// Look up a capture by parameter name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A compiled path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl PathTemplate {
    /// Parse a template such as `/inventory/{proxy+}`.
    pub fn parse(raw: &str) -> Result<Self, TemplateError> {
        let body = raw
            .strip_prefix('/')
            .ok_or_else(|| TemplateError::MissingLeadingSlash(raw.to_string()))?;

        let mut segments: Vec<Segment> = Vec::new();
        if !body.is_empty() {
            let parts: Vec<&str> = body.split('/').collect();
            let last = parts.len() - 1;
            for (i, part) in parts.into_iter().enumerate() {
                let segment = parse_segment(raw, part)?;
                if matches!(segment, Segment::Greedy(_)) && i != last {
                    return Err(TemplateError::GreedyNotLast(raw.to_string()));
                }
                if let Some(name) = segment.param_name() {
                    if segments.iter().any(|s| s.param_name() == Some(name)) {
                        return Err(TemplateError::DuplicateParam {
                            template: raw.to_string(),
                            name: name.to_string(),
                        });
                    }
                }
                segments.push(segment);
            }
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Names of all parameter segments, in order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(Segment::param_name)
    }

    /// Name of the trailing greedy segment, if any.
    pub fn greedy_param(&self) -> Option<&str> {
        match self.segments.last() {
            Some(Segment::Greedy(name)) => Some(name),
            _ => None,
        }
    }

    /// Per-position ranks; compared lexicographically, greater is more specific.
    pub fn specificity(&self) -> Vec<u8> {
        self.segments.iter().map(Segment::rank).collect()
    }

    /// True when both templates match exactly the same set of paths.
    pub fn same_shape(&self, other: &PathTemplate) -> bool {
        self.segments.len() == other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|(a, b)| match (a, b) {
                    (Segment::Literal(x), Segment::Literal(y)) => x == y,
                    _ => a.rank() == b.rank(),
                })
    }

    /// Match a request path, returning captures on success.
    pub fn matches(&self, path: &str) -> Option<Captures> {
        let mut remaining = path.strip_prefix('/')?;
        let mut captures = Vec::new();

        for segment in &self.segments {
            if let Segment::Greedy(name) = segment {
                if remaining.is_empty() {
                    return None;
                }
                captures.push((name.clone(), remaining.to_string()));
                return Some(Captures(captures));
            }

            let (head, tail) = remaining.split_once('/').unwrap_or((remaining, ""));
            if head.is_empty() {
                return None;
            }
            match segment {
                Segment::Literal(literal) if literal != head => return None,
                Segment::Param(name) => captures.push((name.clone(), head.to_string())),
                _ => {}
            }
            remaining = tail;
        }

        remaining.is_empty().then_some(Captures(captures))
    }
}

impl std::fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

fn parse_segment(template: &str, part: &str) -> Result<Segment, TemplateError> {
    if part.is_empty() {
        return Err(TemplateError::EmptySegment(template.to_string()));
    }
    let malformed = || TemplateError::MalformedSegment {
        template: template.to_string(),
        segment: part.to_string(),
    };

    if let Some(inner) = part.strip_prefix('{') {
        let inner = inner.strip_suffix('}').ok_or_else(malformed)?;
        let (name, greedy) = match inner.strip_suffix('+') {
            Some(name) => (name, true),
            None => (inner, false),
        };
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(malformed());
        }
        return Ok(if greedy {
            Segment::Greedy(name.to_string())
        } else {
            Segment::Param(name.to_string())
        });
    }

    if part.contains('{') || part.contains('}') {
        return Err(malformed());
    }
    Ok(Segment::Literal(part.to_string()))
}
