pub mod colors;
pub mod shutdown;

pub fn signal_ready() {
    std::fs::write("/etc/ready", "ready").expect("Failed to write readiness file");
}

pub mod annotations {
    pub const CREATED_BY: &str = "ceph.pgc.dev/created-by";
    pub const SPEC_HASH: &str = "ceph.pgc.dev/spec-hash";
}
