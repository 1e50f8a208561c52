//! The party asking for access: identity plus resolved role names.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::node::{UserId, Workspace};

/// Prefix of the role granting full control over one workspace.
pub const WORKSPACE_MANAGER_PREFIX: &str = "ROLE_WS_MANAGER_";

/// Role carried by a user impersonating a workspace role.
pub const USURPATE_WORKSPACE_ROLE: &str = "ROLE_USURPATE_WORKSPACE_ROLE";

/// Name of the manager role of `workspace` for the given prefix.
pub fn manager_role_name(prefix: &str, workspace: &Workspace) -> String {
    format!("{prefix}{}", workspace.guid)
}

/// Ordered, de-duplicated set of role names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleSet(BTreeSet<String>);

impl RoleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, role: &str) -> bool {
        self.0.contains(role)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for RoleSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<'a> IntoIterator for &'a RoleSet {
    type Item = &'a String;
    type IntoIter = std::collections::btree_set::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Identity and roles of the party asking for access.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requester {
    /// `None` for anonymous requesters.
    pub user: Option<UserId>,
    pub roles: RoleSet,
}

impl Requester {
    pub fn authenticated<I, S>(user: UserId, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            user: Some(user),
            roles: roles.into_iter().collect(),
        }
    }

    pub fn anonymous<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            user: None,
            roles: roles.into_iter().collect(),
        }
    }

    /// Whether this requester is `user`. Anonymous requesters are nobody.
    pub fn is(&self, user: UserId) -> bool {
        self.user == Some(user)
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}
