//! Role set construction and rank ordering.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Serialize, Serializer};

use crate::RoleError;

/// Rank value assigned to a role by its declaration.
pub type Rank = i64;

#[derive(Debug)]
struct Member {
    name: String,
    rank: Rank,
}

#[derive(Debug)]
struct SetInner {
    name: String,
    members: Vec<Member>,
}

/// A named, closed, alias-free set of ranked roles.
///
/// Cloning is cheap; clones refer to the same set, so roles obtained through
/// any clone compare with each other.
#[derive(Debug, Clone)]
pub struct RoleSet {
    inner: Arc<SetInner>,
}

impl RoleSet {
    /// Starts declaring a new set.
    pub fn builder(name: impl Into<String>) -> RoleSetBuilder {
        RoleSetBuilder {
            name: name.into(),
            members: Vec::new(),
        }
    }

    /// Returns the set name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Looks up a member by name.
    pub fn get(&self, name: &str) -> Option<Role> {
        self.inner
            .members
            .iter()
            .position(|m| m.name == name)
            .map(|index| self.role_at(index))
    }

    /// Looks up a member by rank.
    pub fn by_rank(&self, rank: Rank) -> Option<Role> {
        self.inner
            .members
            .iter()
            .position(|m| m.rank == rank)
            .map(|index| self.role_at(index))
    }

    /// Returns all members in declaration order.
    pub fn members(&self) -> Vec<Role> {
        (0..self.inner.members.len())
            .map(|index| self.role_at(index))
            .collect()
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.inner.members.len()
    }

    /// Returns whether the set has no members.
    pub fn is_empty(&self) -> bool {
        self.inner.members.is_empty()
    }

    fn role_at(&self, index: usize) -> Role {
        Role {
            set: Arc::clone(&self.inner),
            index,
        }
    }
}

impl PartialEq for RoleSet {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for RoleSet {}

/// Declares the members of a [`RoleSet`].
///
/// Validation runs once, in [`RoleSetBuilder::build`].
#[derive(Debug, Clone)]
pub struct RoleSetBuilder {
    name: String,
    members: Vec<(String, Rank)>,
}

impl RoleSetBuilder {
    /// Declares a member with its rank.
    #[must_use]
    pub fn role(mut self, name: impl Into<String>, rank: Rank) -> Self {
        self.members.push((name.into(), rank));
        self
    }

    /// Validates the declaration and freezes the set.
    ///
    /// # Errors
    ///
    /// - [`RoleError::DuplicateRank`] when a member reuses the rank of an
    ///   earlier one; the error names both members.
    /// - [`RoleError::DuplicateName`] when a name is declared twice.
    /// - [`RoleError::Empty`] when nothing was declared.
    pub fn build(self) -> Result<RoleSet, RoleError> {
        if self.members.is_empty() {
            return Err(RoleError::Empty { set: self.name });
        }

        let mut members: Vec<Member> = Vec::with_capacity(self.members.len());
        for (name, rank) in self.members {
            if members.iter().any(|m| m.name == name) {
                return Err(RoleError::DuplicateName {
                    set: self.name,
                    name,
                });
            }
            if let Some(existing) = members.iter().find(|m| m.rank == rank) {
                return Err(RoleError::DuplicateRank {
                    existing: existing.name.clone(),
                    set: self.name,
                    name,
                    rank,
                });
            }
            members.push(Member { name, rank });
        }

        Ok(RoleSet {
            inner: Arc::new(SetInner {
                name: self.name,
                members,
            }),
        })
    }
}

/// A member of a [`RoleSet`].
///
/// Ordering follows rank inside one set. Roles from different sets are
/// unordered: `partial_cmp` returns `None`.
#[derive(Clone)]
pub struct Role {
    set: Arc<SetInner>,
    index: usize,
}

impl Role {
    /// Member name, e.g. `"ADMIN"`.
    pub fn name(&self) -> &str {
        &self.member().name
    }

    /// Declared rank.
    pub fn rank(&self) -> Rank {
        self.member().rank
    }

    /// Name of the owning set.
    pub fn set_name(&self) -> &str {
        &self.set.name
    }

    /// Returns whether this role was declared by `set`.
    pub fn belongs_to(&self, set: &RoleSet) -> bool {
        Arc::ptr_eq(&self.set, &set.inner)
    }

    fn same_set(&self, other: &Role) -> bool {
        Arc::ptr_eq(&self.set, &other.set)
    }

    fn member(&self) -> &Member {
        &self.set.members[self.index]
    }
}

/// Compares two roles by rank.
///
/// Returns `None` when the roles belong to different sets.
pub fn compare(a: &Role, b: &Role) -> Option<Ordering> {
    a.same_set(b).then(|| a.rank().cmp(&b.rank()))
}

impl PartialEq for Role {
    fn eq(&self, other: &Self) -> bool {
        self.same_set(other) && self.index == other.index
    }
}

impl Eq for Role {}

impl PartialOrd for Role {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        compare(self, other)
    }
}

impl Hash for Role {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(Arc::as_ptr(&self.set), state);
        self.index.hash(state);
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.set.name, self.name())
    }
}

impl fmt::Debug for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Role({}.{}={})", self.set.name, self.name(), self.rank())
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
