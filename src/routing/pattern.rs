//! Path pattern parsing and matching.
//!
//! # Grammar
//! - `/` is the root pattern (no segments)
//! - literal segments match exactly: `/snippet/view`
//! - `:name` captures exactly one non-empty segment: `/snippet/view/:id`
//! - a trailing `*name` captures the rest of the path, slashes included:
//!   `/static/*filepath`
//!
//! # Precedence
//! When several patterns match the same path, the one with a literal at the
//! first differing position wins over a parameter, and a parameter wins over
//! a wildcard. [`Pattern::rank`] encodes this so patterns can be compared.

use super::RouteError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Param(String),
    Wildcard(String),
}

impl Segment {
    fn weight(&self) -> u8 {
        match self {
            Segment::Literal(_) => 0,
            Segment::Param(_) => 1,
            Segment::Wildcard(_) => 2,
        }
    }
}

/// A parsed route pattern
#[derive(Debug, Clone)]
pub struct Pattern {
    raw: String,
    segments: Vec<Segment>,
}

impl Pattern {
    pub fn parse(raw: &str) -> Result<Self, RouteError> {
        let invalid = |reason: &str| RouteError::InvalidPattern {
            pattern: raw.to_string(),
            reason: reason.to_string(),
        };

        let rest = raw
            .strip_prefix('/')
            .ok_or_else(|| invalid("must start with '/'"))?;

        let parts: Vec<&str> = if rest.is_empty() {
            Vec::new()
        } else {
            rest.split('/').collect()
        };

        let mut segments = Vec::with_capacity(parts.len());
        for (i, part) in parts.iter().enumerate() {
            let segment = if let Some(name) = part.strip_prefix(':') {
                if name.is_empty() {
                    return Err(invalid("parameter needs a name"));
                }
                Segment::Param(name.to_string())
            } else if let Some(name) = part.strip_prefix('*') {
                if name.is_empty() {
                    return Err(invalid("wildcard needs a name"));
                }
                if i + 1 != parts.len() {
                    return Err(invalid("wildcard must be the last segment"));
                }
                Segment::Wildcard(name.to_string())
            } else {
                Segment::Literal(part.to_string())
            };
            segments.push(segment);
        }

        let mut names: Vec<&str> = segments
            .iter()
            .filter_map(|s| match s {
                Segment::Param(n) | Segment::Wildcard(n) => Some(n.as_str()),
                Segment::Literal(_) => None,
            })
            .collect();
        names.sort_unstable();
        if names.windows(2).any(|w| w[0] == w[1]) {
            return Err(invalid("parameter names must be unique"));
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Precedence key: lower sorts first and wins
    pub fn rank(&self) -> Vec<u8> {
        self.segments.iter().map(Segment::weight).collect()
    }

    /// The pattern with parameter names erased
    ///
    /// Two patterns with the same shape match exactly the same paths.
    pub fn shape(&self) -> String {
        let mut shape = String::new();
        for segment in &self.segments {
            shape.push('/');
            match segment {
                Segment::Literal(s) => shape.push_str(s),
                Segment::Param(_) => shape.push(':'),
                Segment::Wildcard(_) => shape.push('*'),
            }
        }
        if shape.is_empty() {
            shape.push('/');
        }
        shape
    }

    /// Match a request path, returning the captured parameters
    pub fn matches(&self, path: &str) -> Option<Vec<(String, String)>> {
        let rest = path.strip_prefix('/')?;
        let parts: Vec<&str> = if rest.is_empty() {
            Vec::new()
        } else {
            rest.split('/').collect()
        };

        let mut params = Vec::new();
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Literal(expected) => {
                    if parts.get(i) != Some(&expected.as_str()) {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    let value = parts.get(i).filter(|v| !v.is_empty())?;
                    params.push((name.clone(), (*value).to_string()));
                }
                Segment::Wildcard(name) => {
                    if i >= parts.len() {
                        return None;
                    }
                    params.push((name.clone(), parts[i..].join("/")));
                    return Some(params);
                }
            }
        }

        (parts.len() == self.segments.len()).then_some(params)
    }
}
