use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Type identifier of a structure element: an object id plus a version.
///
/// Elements carry their own type, and every link declares the type of the
/// element it points to. Declared types are what the excluded-type policy
/// matches against when a link target is absent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectType {
    pub object_id: u32,
    pub version: u32,
}

impl ObjectType {
    pub const fn new(object_id: u32, version: u32) -> Self {
        Self { object_id, version }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.object_id, self.version)
    }
}

/// Parses the `Display` form, e.g. `"11v1"`.
impl FromStr for ObjectType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (id, version) = s
            .split_once('v')
            .ok_or_else(|| TypeError::InvalidObjectType(s.to_string()))?;
        let object_id = id
            .parse()
            .map_err(|_| TypeError::InvalidObjectType(s.to_string()))?;
        let version = version
            .parse()
            .map_err(|_| TypeError::InvalidObjectType(s.to_string()))?;
        Ok(Self { object_id, version })
    }
}
