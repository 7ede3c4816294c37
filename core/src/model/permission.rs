// shopfront/src/model/permission.rs

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Coarse-grained capability tag held by a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Permission {
  Admin,
  User,
  #[serde(rename = "ITEMCREATE")]
  ItemCreate,
  #[serde(rename = "ITEMUPDATE")]
  ItemUpdate,
  #[serde(rename = "ITEMDELETE")]
  ItemDelete,
  #[serde(rename = "PERMISSIONUPDATE")]
  PermissionUpdate,
}

pub type PermissionSet = BTreeSet<Permission>;

impl Permission {
  pub const ALL: [Permission; 6] = [
    Permission::Admin,
    Permission::User,
    Permission::ItemCreate,
    Permission::ItemUpdate,
    Permission::ItemDelete,
    Permission::PermissionUpdate,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      Permission::Admin => "ADMIN",
      Permission::User => "USER",
      Permission::ItemCreate => "ITEMCREATE",
      Permission::ItemUpdate => "ITEMUPDATE",
      Permission::ItemDelete => "ITEMDELETE",
      Permission::PermissionUpdate => "PERMISSIONUPDATE",
    }
  }

  /// Permissions every new account starts with.
  pub fn defaults() -> PermissionSet {
    BTreeSet::from([Permission::User])
  }
}

impl fmt::Display for Permission {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown permission tag '{0}'")]
pub struct UnknownPermission(pub String);

impl FromStr for Permission {
  type Err = UnknownPermission;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Permission::ALL
      .into_iter()
      .find(|p| p.as_str() == s)
      .ok_or_else(|| UnknownPermission(s.to_string()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn tags_round_trip_through_their_wire_names() {
    for p in Permission::ALL {
      assert_eq!(p.as_str().parse::<Permission>().unwrap(), p);
      assert_eq!(serde_json::to_string(&p).unwrap(), format!("\"{}\"", p.as_str()));
    }
    assert!("SUPERUSER".parse::<Permission>().is_err());
  }
}
