use std::time::Duration;
pub mod metrics;
pub mod patch;

pub(crate) mod colors;
pub mod lists;
pub mod owner;
pub mod pods;
pub mod resources;
pub mod selector;

mod error;

pub use error::*;

/// The default interval for requeuing a managed resource.
pub(crate) const PROBE_INTERVAL: Duration = Duration::from_secs(30);

/// Requeue-after for states waiting on a condition (pod running, quorum
/// forming, etc), per spec.md 5.
pub(crate) const WAIT_INTERVAL: Duration = Duration::from_secs(1);

/// Requeue-after for steady-state health rechecks of an already-healthy
/// resource, per spec.md 5.
pub(crate) const HEALTH_INTERVAL: Duration = Duration::from_secs(5);

/// Name of the kubernetes resource manager.
pub(crate) const MANAGER_NAME: &str = "ceph-operator";

pub fn hash_spec<T: serde::Serialize>(spec: &T) -> String {
    use sha2::{Digest, Sha256};
    let spec_bytes = serde_json::to_vec(spec).unwrap();
    let mut hasher = Sha256::new();
    hasher.update(&spec_bytes);
    let result = hasher.finalize();
    hex::encode(result)
}
