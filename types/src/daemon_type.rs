use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::error::Error;

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq, Hash, JsonSchema)]
pub enum DaemonType {
    Mon,
    Mgr,
    Mds,
    Rgw,
    Osd,
}

impl Default for DaemonType {
    fn default() -> Self {
        DaemonType::Mgr
    }
}

impl fmt::Display for DaemonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DaemonType::Mon => "mon",
            DaemonType::Mgr => "mgr",
            DaemonType::Mds => "mds",
            DaemonType::Rgw => "rgw",
            DaemonType::Osd => "osd",
        };
        write!(f, "{s}")
    }
}

impl FromStr for DaemonType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mon" => Ok(DaemonType::Mon),
            "mgr" => Ok(DaemonType::Mgr),
            "mds" => Ok(DaemonType::Mds),
            "rgw" => Ok(DaemonType::Rgw),
            "osd" => Ok(DaemonType::Osd),
            other => Err(Error::InvalidDaemonType(other.to_string())),
        }
    }
}
