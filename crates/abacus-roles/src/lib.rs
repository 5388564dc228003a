//! # abacus-roles: Ranked role hierarchies
//!
//! A role is an identifier that fits into a closed hierarchy of identifiers of
//! the same set. Every member of a [`RoleSet`] carries a caller-assigned rank,
//! and roles compare by rank within their own set.
//!
//! By convention a lower rank denotes higher authority (`ROOT = 1` outranks
//! `USER = 10`), but nothing in this crate depends on that: it only needs the
//! ranks inside one set to be distinct.
//!
//! ## Examples
//!
//! ```
//! use abacus_roles::RoleSet;
//!
//! let roles = RoleSet::builder("StaffRoles")
//!     .role("ROOT", 1)
//!     .role("ADMIN", 5)
//!     .role("USER", 10)
//!     .build()?;
//!
//! let root = roles.get("ROOT").unwrap();
//! let admin = roles.get("ADMIN").unwrap();
//! let user = roles.get("USER").unwrap();
//!
//! assert!(root < admin && admin < user);
//! assert!(!(user <= admin));
//! # Ok::<(), abacus_roles::RoleError>(())
//! ```
//!
//! ## Cross-set comparisons
//!
//! Roles from unrelated sets are unordered: `<`, `<=`, `>` and `>=` all return
//! `false` and `==` is never true. Comparisons never panic.
//!
//! ```
//! use abacus_roles::RoleSet;
//!
//! let staff = RoleSet::builder("Staff").role("ADMIN", 1).build()?;
//! let guests = RoleSet::builder("Guests").role("VISITOR", 1).build()?;
//!
//! let admin = staff.get("ADMIN").unwrap();
//! let visitor = guests.get("VISITOR").unwrap();
//!
//! assert!(!(admin < visitor) && !(admin >= visitor));
//! assert_ne!(admin, visitor);
//! # Ok::<(), abacus_roles::RoleError>(())
//! ```

mod set;

pub use set::{Rank, Role, RoleSet, RoleSetBuilder, compare};

use thiserror::Error;

/// Definition-time errors raised while building a [`RoleSet`].
///
/// These are static correctness errors: the declaration has to be fixed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoleError {
    /// Two members share a rank (aliases are not allowed).
    #[error("aliases not allowed in {set}: {name:?} --> {existing:?} (rank {rank})")]
    DuplicateRank {
        set: String,
        name: String,
        existing: String,
        rank: Rank,
    },

    /// A member name was declared more than once.
    #[error("role {name:?} declared twice in {set}")]
    DuplicateName { set: String, name: String },

    /// The set has no members.
    #[error("role set {set} has no members")]
    Empty { set: String },
}
