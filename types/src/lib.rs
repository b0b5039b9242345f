pub mod cephconf;
pub mod crd;
pub mod daemon_type;
pub mod error;
pub mod idgen;
pub mod keyring;
pub mod labels;
pub mod monmap;

pub mod state {
    pub mod cluster_state;
    pub mod daemon_state;
    pub mod daemoncluster_state;
    pub mod mon_state;
    pub mod moncluster_state;
}

pub use crd::*;
pub use daemon_type::DaemonType;
pub use error::Error;
