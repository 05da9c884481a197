//! Compiled route table and path resolution.
//!
//! # Responsibility
//! - Flatten a `RouteDef` tree into records with absolute patterns.
//! - Reject ambiguous or dangling definitions at build time.
//! - Resolve request paths to views, following redirects.
//!
//! # Invariants
//! - No two siblings share a canonical pattern.
//! - Route names are unique across the whole table.
//! - Every redirect target matches at least one record.
//! - Among matches, static segments outrank params; earlier records win ties.

use crate::routing::path::{
    join_paths, normalize_request_path, split_segments, PathPattern, PathPatternError,
    RouteParams,
};
use crate::routing::route::{RouteDef, RouteMeta, ViewId};
use log::{debug, warn};
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Upper bound on chained redirects before resolution gives up.
pub const MAX_REDIRECTS: usize = 8;

/// Flattened route with its absolute pattern and inherited meta.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRecord {
    pub pattern: PathPattern,
    pub name: Option<String>,
    pub view: Option<ViewId>,
    pub redirect: Option<PathPattern>,
    /// Meta merged from every ancestor down to this record.
    pub meta: RouteMeta,
    /// Index of the parent record, if nested.
    pub parent: Option<usize>,
}

/// Result of resolving a request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoute {
    /// Normalized path that finally matched.
    pub path: String,
    pub pattern: String,
    pub name: Option<String>,
    pub view: ViewId,
    pub params: RouteParams,
    /// Raw query string without the leading `?`.
    pub query: Option<String>,
    /// Patterns from the outermost ancestor down to the matched record.
    pub matched: Vec<String>,
    pub meta: RouteMeta,
    /// First path requested when one or more redirects were followed.
    pub redirected_from: Option<String>,
}

impl ResolvedRoute {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Path plus query, suitable for a post-login `redirect=` value.
    pub fn full_path(&self) -> String {
        match &self.query {
            Some(query) => format!("{}?{}", self.path, query),
            None => self.path.clone(),
        }
    }
}

/// Immutable, validated route table.
#[derive(Debug, Clone)]
pub struct RouteTable {
    records: Vec<RouteRecord>,
    by_name: BTreeMap<String, usize>,
}

impl RouteTable {
    /// Validates and compiles route definitions.
    pub fn build(defs: &[RouteDef]) -> Result<Self, RouteBuildError> {
        let mut table = Self {
            records: Vec::new(),
            by_name: BTreeMap::new(),
        };
        let mut root_siblings = BTreeSet::new();
        for def in defs {
            table.add_def(def, None, RouteMeta::default(), &mut root_siblings)?;
        }
        table.check_redirects()?;
        debug!(
            "event=route_table_build module=routing status=ok routes={}",
            table.records.len()
        );
        Ok(table)
    }

    pub fn records(&self) -> &[RouteRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn find_by_name(&self, name: &str) -> Option<&RouteRecord> {
        self.by_name.get(name).map(|&index| &self.records[index])
    }

    /// Builds a concrete path for a named route.
    pub fn url_for(&self, name: &str, params: &RouteParams) -> Option<String> {
        self.find_by_name(name)?.pattern.fill(params)
    }

    /// Resolves a request path, following redirects.
    ///
    /// Returns `None` when nothing renders at the path or the redirect
    /// chain exceeds `MAX_REDIRECTS`.
    pub fn resolve(&self, path: &str) -> Option<ResolvedRoute> {
        let query = extract_query(path);
        let mut current = normalize_request_path(path);
        let mut redirected_from: Option<String> = None;

        for _ in 0..=MAX_REDIRECTS {
            let (index, params) = self.match_path(&current)?;
            let record = &self.records[index];

            if let Some(target) = &record.redirect {
                let next = target.fill(&params)?;
                debug!(
                    "event=route_redirect module=routing status=ok from={} to={}",
                    current, next
                );
                redirected_from.get_or_insert_with(|| current.clone());
                current = next;
                continue;
            }

            let view = record.view.clone()?;
            return Some(ResolvedRoute {
                path: current,
                pattern: record.pattern.as_str().to_string(),
                name: record.name.clone(),
                view,
                params,
                query,
                matched: self.chain(index),
                meta: record.meta,
                redirected_from,
            });
        }

        warn!(
            "event=route_redirect module=routing status=error reason=too_many_redirects path={}",
            redirected_from.as_deref().unwrap_or(current.as_str())
        );
        None
    }

    fn add_def(
        &mut self,
        def: &RouteDef,
        parent: Option<usize>,
        inherited: RouteMeta,
        siblings: &mut BTreeSet<String>,
    ) -> Result<(), RouteBuildError> {
        let parent_path = parent.map_or("/", |index| self.records[index].pattern.as_str());
        let full_path = join_paths(parent_path, &def.path);
        let pattern =
            PathPattern::parse(&full_path).map_err(|source| RouteBuildError::InvalidPath {
                path: full_path.clone(),
                source,
            })?;

        if def.view.is_none() && def.redirect.is_none() && def.children.is_empty() {
            return Err(RouteBuildError::EmptyRoute(pattern.as_str().to_string()));
        }
        if !siblings.insert(pattern.as_str().to_string()) {
            return Err(RouteBuildError::DuplicatePath {
                parent: parent.map(|index| self.records[index].pattern.as_str().to_string()),
                path: pattern.as_str().to_string(),
            });
        }

        let redirect = match &def.redirect {
            Some(target) => {
                let target_path = join_paths(parent_path, target);
                let target_pattern = PathPattern::parse(&target_path).map_err(|_| {
                    RouteBuildError::InvalidRedirect {
                        from: pattern.as_str().to_string(),
                        target: target.clone(),
                    }
                })?;
                let available: BTreeSet<&str> = pattern.param_names().collect();
                if target_pattern
                    .param_names()
                    .any(|name| !available.contains(name))
                {
                    return Err(RouteBuildError::InvalidRedirect {
                        from: pattern.as_str().to_string(),
                        target: target.clone(),
                    });
                }
                Some(target_pattern)
            }
            None => None,
        };

        let index = self.records.len();
        if let Some(name) = &def.name {
            if self.by_name.insert(name.clone(), index).is_some() {
                return Err(RouteBuildError::DuplicateName(name.clone()));
            }
        }

        let meta = inherited.merged_with(def.meta);
        self.records.push(RouteRecord {
            pattern,
            name: def.name.clone(),
            view: def.view.clone(),
            redirect,
            meta,
            parent,
        });

        let mut child_siblings = BTreeSet::new();
        for child in &def.children {
            self.add_def(child, Some(index), meta, &mut child_siblings)?;
        }
        Ok(())
    }

    fn check_redirects(&self) -> Result<(), RouteBuildError> {
        for record in &self.records {
            let Some(target) = &record.redirect else {
                continue;
            };
            let placeholders: RouteParams = target
                .param_names()
                .map(|name| (name.to_string(), "0".to_string()))
                .collect();
            let probe = target.fill(&placeholders).unwrap_or_default();
            if self.match_path(&probe).is_none() {
                return Err(RouteBuildError::UnresolvedRedirect {
                    from: record.pattern.as_str().to_string(),
                    target: target.as_str().to_string(),
                });
            }
        }
        Ok(())
    }

    /// Best renderable record for a normalized path.
    fn match_path(&self, path: &str) -> Option<(usize, RouteParams)> {
        let request: Vec<&str> = split_segments(path).collect();
        let mut best: Option<(usize, RouteParams, Vec<u8>)> = None;

        for (index, record) in self.records.iter().enumerate() {
            if record.view.is_none() && record.redirect.is_none() {
                continue;
            }
            let Some(params) = record.pattern.match_segments(&request) else {
                continue;
            };
            let score = record.pattern.specificity();
            let better = match &best {
                Some((_, _, best_score)) => score > *best_score,
                None => true,
            };
            if better {
                best = Some((index, params, score));
            }
        }

        best.map(|(index, params, _)| (index, params))
    }

    fn chain(&self, index: usize) -> Vec<String> {
        let mut chain = Vec::new();
        let mut cursor = Some(index);
        while let Some(current) = cursor {
            let record = &self.records[current];
            chain.push(record.pattern.as_str().to_string());
            cursor = record.parent;
        }
        chain.reverse();
        chain
    }
}

fn extract_query(path: &str) -> Option<String> {
    let without_fragment = path.split('#').next().unwrap_or_default();
    let (_, query) = without_fragment.split_once('?')?;
    if query.is_empty() {
        None
    } else {
        Some(query.to_string())
    }
}

/// Route table build failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteBuildError {
    InvalidPath {
        path: String,
        source: PathPatternError,
    },
    DuplicatePath {
        parent: Option<String>,
        path: String,
    },
    DuplicateName(String),
    /// Route has no view, no redirect and no children.
    EmptyRoute(String),
    InvalidRedirect {
        from: String,
        target: String,
    },
    UnresolvedRedirect {
        from: String,
        target: String,
    },
}

impl Display for RouteBuildError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPath { path, source } => write!(f, "invalid route `{path}`: {source}"),
            Self::DuplicatePath { parent, path } => match parent {
                Some(parent) => write!(f, "route `{path}` registered twice under `{parent}`"),
                None => write!(f, "top-level route `{path}` registered twice"),
            },
            Self::DuplicateName(name) => write!(f, "route name `{name}` registered twice"),
            Self::EmptyRoute(path) => {
                write!(f, "route `{path}` has no view, redirect or children")
            }
            Self::InvalidRedirect { from, target } => {
                write!(f, "route `{from}` has invalid redirect `{target}`")
            }
            Self::UnresolvedRedirect { from, target } => {
                write!(f, "route `{from}` redirects to `{target}` which matches no route")
            }
        }
    }
}

impl Error for RouteBuildError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidPath { source, .. } => Some(source),
            _ => None,
        }
    }
}
