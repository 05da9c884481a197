//! Declarative route definitions.
//!
//! A `RouteDef` tree is plain data; `RouteTable::build` validates and
//! compiles it.

use std::fmt::{Display, Formatter};

/// Identifier of the view a route renders, e.g. `PostDetailView`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ViewId(String);

impl ViewId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ViewId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Role a signed-in user holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    Member,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Admin => "admin",
        }
    }

    /// Admins satisfy every role requirement.
    pub fn satisfies(self, required: Role) -> bool {
        self == Role::Admin || self == required
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "member" => Some(Self::Member),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Navigation gating flags carried by a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RouteMeta {
    pub requires_auth: bool,
    pub role: Option<Role>,
}

impl RouteMeta {
    /// Merges an inner route's meta over an outer one.
    ///
    /// `requires_auth` is inherited once set; the innermost role wins.
    pub fn merged_with(self, inner: RouteMeta) -> RouteMeta {
        RouteMeta {
            requires_auth: self.requires_auth || inner.requires_auth,
            role: inner.role.or(self.role),
        }
    }
}

/// One node of a route tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDef {
    pub path: String,
    pub name: Option<String>,
    pub view: Option<ViewId>,
    pub redirect: Option<String>,
    pub meta: RouteMeta,
    pub children: Vec<RouteDef>,
}

impl RouteDef {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: None,
            view: None,
            redirect: None,
            meta: RouteMeta::default(),
            children: Vec::new(),
        }
    }

    /// Shorthand for a named route rendering `view`.
    pub fn view(path: impl Into<String>, name: impl Into<String>, view: &str) -> Self {
        Self::new(path).named(name).with_view(view)
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_view(mut self, view: &str) -> Self {
        self.view = Some(ViewId::new(view));
        self
    }

    pub fn redirect_to(mut self, target: impl Into<String>) -> Self {
        self.redirect = Some(target.into());
        self
    }

    pub fn requires_auth(mut self) -> Self {
        self.meta.requires_auth = true;
        self
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.meta.role = Some(role);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = RouteDef>) -> Self {
        self.children.extend(children);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::{Role, RouteDef, RouteMeta};

    #[test]
    fn admin_satisfies_any_role() {
        assert!(Role::Admin.satisfies(Role::Member));
        assert!(Role::Admin.satisfies(Role::Admin));
        assert!(!Role::Member.satisfies(Role::Admin));
    }

    #[test]
    fn meta_merge_inherits_auth_and_prefers_inner_role() {
        let outer = RouteMeta {
            requires_auth: true,
            role: Some(Role::Admin),
        };
        let merged = outer.merged_with(RouteMeta::default());
        assert_eq!(merged, outer);

        let inner = RouteMeta {
            requires_auth: false,
            role: Some(Role::Member),
        };
        let merged = outer.merged_with(inner);
        assert!(merged.requires_auth);
        assert_eq!(merged.role, Some(Role::Member));
    }

    #[test]
    fn builder_sets_fields() {
        let def = RouteDef::view("posts/:id", "postdetails", "PostDetailView")
            .requires_auth()
            .with_role(Role::Member);
        assert_eq!(def.name.as_deref(), Some("postdetails"));
        assert_eq!(def.view.as_ref().map(|view| view.as_str()), Some("PostDetailView"));
        assert!(def.meta.requires_auth);
        assert_eq!(Role::parse(" ADMIN "), Some(Role::Admin));
        assert_eq!(Role::parse("guest"), None);
    }
}
