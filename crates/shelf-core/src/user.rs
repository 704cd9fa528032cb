//! User identity. Users are referenced, never mutated, by the like and feed
//! services.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub user_id:  i64,
  pub username: String,
}
