//! Like targets and the per-target like aggregate.

use std::{collections::BTreeSet, fmt};

use serde::{Deserialize, Serialize};

/// Which kind of record a like points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
  Activity,
  Status,
}

/// A likeable record. Activity and status ids live in separate id spaces, so
/// `Activity(7)` and `Status(7)` are unrelated targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum LikeTarget {
  Activity(i64),
  Status(i64),
}

impl LikeTarget {
  pub fn kind(&self) -> TargetKind {
    match self {
      Self::Activity(_) => TargetKind::Activity,
      Self::Status(_) => TargetKind::Status,
    }
  }

  pub fn id(&self) -> i64 {
    match *self {
      Self::Activity(id) | Self::Status(id) => id,
    }
  }
}

impl fmt::Display for LikeTarget {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Activity(id) => write!(f, "activity:{id}"),
      Self::Status(id) => write!(f, "status:{id}"),
    }
  }
}

/// The set of users who like one target.
///
/// Created lazily on the first like and never deleted; an aggregate whose
/// membership drops to empty is kept and reused by later likes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeAggregate {
  pub like_id:  i64,
  pub target:   LikeTarget,
  pub liked_by: BTreeSet<i64>,
}

impl LikeAggregate {
  pub fn is_liked_by(&self, user_id: i64) -> bool { self.liked_by.contains(&user_id) }
}

/// Outcome of a toggle: the acting user's membership after the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toggle {
  pub liked: bool,
}
