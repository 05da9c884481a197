//! Route path patterns and request path normalization.
//!
//! # Invariants
//! - Patterns are absolute once joined; `/` has zero segments.
//! - Parameter names are identifiers and unique within one pattern.
//! - Empty segments are dropped, so `/posts//42/` equals `/posts/42`.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

static PARAM_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid param name regex"));
static STATIC_SEGMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^:?#*\s/]+$").expect("valid static segment regex"));

/// Captured path parameters keyed by name.
pub type RouteParams = BTreeMap<String, String>;

/// One segment of a compiled pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Static(String),
    Param(String),
}

/// Compiled absolute path pattern such as `/posts/:id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Parses an absolute pattern.
    pub fn parse(raw: &str) -> Result<Self, PathPatternError> {
        if !raw.starts_with('/') {
            return Err(PathPatternError::NotAbsolute(raw.to_string()));
        }

        let mut segments = Vec::new();
        let mut seen_params = BTreeSet::new();
        for part in split_segments(raw) {
            if let Some(name) = part.strip_prefix(':') {
                if !PARAM_NAME_RE.is_match(name) {
                    return Err(PathPatternError::InvalidParamName {
                        pattern: raw.to_string(),
                        name: name.to_string(),
                    });
                }
                if !seen_params.insert(name.to_string()) {
                    return Err(PathPatternError::DuplicateParam {
                        pattern: raw.to_string(),
                        name: name.to_string(),
                    });
                }
                segments.push(Segment::Param(name.to_string()));
            } else if STATIC_SEGMENT_RE.is_match(part) {
                segments.push(Segment::Static(part.to_string()));
            } else {
                return Err(PathPatternError::InvalidSegment {
                    pattern: raw.to_string(),
                    segment: part.to_string(),
                });
            }
        }

        Ok(Self {
            raw: render(&segments),
            segments,
        })
    }

    /// Canonical text form, e.g. `/admin/annouce/:id`.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Param(name) => Some(name.as_str()),
            Segment::Static(_) => None,
        })
    }

    /// Matches already-split request segments, returning captured params.
    ///
    /// Param values are percent-decoded; undecodable values are kept raw.
    pub fn match_segments(&self, request: &[&str]) -> Option<RouteParams> {
        if request.len() != self.segments.len() {
            return None;
        }
        let mut params = RouteParams::new();
        for (segment, value) in self.segments.iter().zip(request) {
            match segment {
                Segment::Static(expected) if expected == value => {}
                Segment::Static(_) => return None,
                Segment::Param(name) => {
                    let decoded = urlencoding::decode(value)
                        .map(|decoded| decoded.into_owned())
                        .unwrap_or_else(|_| (*value).to_string());
                    params.insert(name.clone(), decoded);
                }
            }
        }
        Some(params)
    }

    /// Specificity used to rank competing matches; static beats param per segment.
    pub fn specificity(&self) -> Vec<u8> {
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Static(_) => 2,
                Segment::Param(_) => 1,
            })
            .collect()
    }

    /// Substitutes percent-encoded params into the pattern. Missing params fail.
    pub fn fill(&self, params: &RouteParams) -> Option<String> {
        let mut parts = Vec::with_capacity(self.segments.len());
        for segment in &self.segments {
            match segment {
                Segment::Static(value) => parts.push(value.clone()),
                Segment::Param(name) => {
                    parts.push(urlencoding::encode(params.get(name)?).into_owned())
                }
            }
        }
        Some(format!("/{}", parts.join("/")))
    }
}

impl Display for PathPattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Joins a child path onto its parent's absolute path.
///
/// Children starting with `/` are already absolute and returned as-is.
pub fn join_paths(parent: &str, child: &str) -> String {
    if child.starts_with('/') {
        return child.to_string();
    }
    let parent = parent.trim_end_matches('/');
    if child.is_empty() {
        return if parent.is_empty() {
            "/".to_string()
        } else {
            parent.to_string()
        };
    }
    format!("{parent}/{child}")
}

/// Strips query and fragment, collapses slashes, drops a trailing slash.
pub fn normalize_request_path(path: &str) -> String {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    let parts: Vec<&str> = split_segments(&path[..end]).collect();
    format!("/{}", parts.join("/"))
}

/// Non-empty `/`-separated segments.
pub fn split_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|part| !part.is_empty())
}

fn render(segments: &[Segment]) -> String {
    let parts: Vec<String> = segments
        .iter()
        .map(|segment| match segment {
            Segment::Static(value) => value.clone(),
            Segment::Param(name) => format!(":{name}"),
        })
        .collect();
    format!("/{}", parts.join("/"))
}

/// Pattern parse failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPatternError {
    NotAbsolute(String),
    InvalidParamName { pattern: String, name: String },
    DuplicateParam { pattern: String, name: String },
    InvalidSegment { pattern: String, segment: String },
}

impl Display for PathPatternError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAbsolute(pattern) => write!(f, "route path must be absolute: `{pattern}`"),
            Self::InvalidParamName { pattern, name } => {
                write!(f, "invalid parameter name `{name}` in `{pattern}`")
            }
            Self::DuplicateParam { pattern, name } => {
                write!(f, "parameter `{name}` declared twice in `{pattern}`")
            }
            Self::InvalidSegment { pattern, segment } => {
                write!(f, "invalid path segment `{segment}` in `{pattern}`")
            }
        }
    }
}

impl Error for PathPatternError {}
