//! Route tables of the community site, one per published revision.
//!
//! Each revision extends the previous one:
//! - V1: home with post/review/question lists.
//! - V2: detail pages and the login/register screens.
//! - V3: the gated `/admin` subtree.
//! - V4: admin CRUD screens registered at top level, outside the gate.
//! - V5: CRUD screens folded back under `/admin`; profile and owner edits.

use crate::routing::route::{Role, RouteDef};
use crate::routing::table::{RouteBuildError, RouteTable};
use std::fmt::{Display, Formatter};

/// Published route table revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RouteRevision {
    V1,
    V2,
    V3,
    V4,
    V5,
}

impl RouteRevision {
    pub const ALL: [RouteRevision; 5] = [Self::V1, Self::V2, Self::V3, Self::V4, Self::V5];

    pub fn latest() -> Self {
        Self::V5
    }

    pub fn number(self) -> u8 {
        match self {
            Self::V1 => 1,
            Self::V2 => 2,
            Self::V3 => 3,
            Self::V4 => 4,
            Self::V5 => 5,
        }
    }

    pub fn from_number(value: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|revision| revision.number() == value)
    }

    /// Route tree declared by this revision.
    pub fn definitions(self) -> Vec<RouteDef> {
        match self {
            Self::V1 => vec![home(false)],
            Self::V2 => {
                let mut defs = vec![home(true)];
                defs.extend(auth_screens());
                defs
            }
            Self::V3 => {
                let mut defs = Self::V2.definitions();
                defs.push(admin_area(false));
                defs
            }
            Self::V4 => {
                let mut defs = Self::V3.definitions();
                defs.extend(ungated_admin_crud());
                defs
            }
            Self::V5 => {
                let mut defs = vec![home(true)];
                defs.extend(auth_screens());
                defs.push(admin_area(true));
                defs.extend(owner_screens());
                defs
            }
        }
    }

    /// Builds the compiled table for this revision.
    pub fn table(self) -> Result<RouteTable, RouteBuildError> {
        RouteTable::build(&self.definitions())
    }
}

impl Display for RouteRevision {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.number())
    }
}

fn home(with_details: bool) -> RouteDef {
    let mut children = vec![
        RouteDef::view("posts", "posts", "PostView"),
        RouteDef::view("reviews", "reviews", "ReviewView"),
        RouteDef::view("questions", "questions", "QuestionView"),
    ];
    if with_details {
        children.extend([
            RouteDef::view("posts/:id", "postdetails", "PostDetailView"),
            RouteDef::view("reviews/:id", "reviewdetails", "ReviewDetailView"),
            RouteDef::view("questions/:id", "questiondetails", "QuestionDetailView"),
        ]);
    }
    RouteDef::view("/", "home", "HomeView")
        .redirect_to("posts")
        .with_children(children)
}

fn auth_screens() -> Vec<RouteDef> {
    vec![
        RouteDef::view("/login", "login", "LoginView"),
        RouteDef::view("/register", "register", "RegisterView"),
    ]
}

fn admin_area(with_crud: bool) -> RouteDef {
    let mut children = vec![
        RouteDef::view("annouce", "annouce", "AdminAnnounceView"),
        RouteDef::view("annouce/:id", "annoucedetails", "AdminAnnounceDetailView"),
        RouteDef::view("review/:id", "adminreviewdetails", "AdminReviewDetailView"),
        RouteDef::view("question/:id", "adminquestiondetails", "AdminQuestionDetailView"),
    ];
    if with_crud {
        children.extend(admin_crud_children());
    }
    RouteDef::view("/admin", "admin", "AdminView")
        .redirect_to("/admin/annouce")
        .requires_auth()
        .with_role(Role::Admin)
        .with_children(children)
}

fn admin_crud_children() -> Vec<RouteDef> {
    vec![
        RouteDef::view("add-annouce", "addannouce", "AddAnnounceView"),
        RouteDef::view("edit-annouce/:id", "editannouce", "EditAnnounceView"),
        RouteDef::view("review", "adminreview", "AdminReviewView"),
        RouteDef::view("add-review", "addreview", "AddReviewView"),
        RouteDef::view("edit-review/:id", "admineditreview", "AdminEditReviewView"),
        RouteDef::view("question", "adminquestion", "AdminQuestionView"),
        RouteDef::view("add-question", "addquestion", "AddQuestionView"),
        RouteDef::view("edit-question/:id", "admineditquestion", "AdminEditQuestionView"),
    ]
}

// V4 shipped these as absolute top-level routes, so the `/admin` gate
// does not cover them.
fn ungated_admin_crud() -> Vec<RouteDef> {
    admin_crud_children()
        .into_iter()
        .map(|mut def| {
            def.path = format!("/admin/{}", def.path);
            def
        })
        .collect()
}

fn owner_screens() -> Vec<RouteDef> {
    vec![
        RouteDef::view("/edit-review/:id", "editreview", "EditReviewView").requires_auth(),
        RouteDef::view("/edit-question/:id", "editquestion", "EditQuestionView").requires_auth(),
        RouteDef::view("/edit-profile", "editprofile", "EditProfileView").requires_auth(),
    ]
}
