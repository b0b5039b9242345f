pub const GROUP: &str = "ceph.pgc.dev";
pub const VERSION: &str = "v1alpha1";

pub const CLUSTER_NAME: &str = "ceph.pgc.dev/cluster-name";
pub const DAEMON_TYPE: &str = "ceph.pgc.dev/daemon-type";
pub const KEYRING_ENTITY: &str = "ceph.pgc.dev/keyring-entity";
pub const MONITOR_SERVICE: &str = "ceph.pgc.dev/monitor-service";
