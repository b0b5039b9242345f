use std::collections::BTreeMap;

use ceph_types::{CephDaemon, CephDaemonCluster, idgen, labels};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::ResourceExt;

use crate::util::owner::set_owner;

/// A freshly-minted Daemon child: id follows the same lowercase-letter +
/// random-alphanumeric shape as Mon ids (spec.md 3), config-map name and
/// image copied from the parent DaemonCluster.
pub fn daemon_resource(daemon_cluster: &CephDaemonCluster) -> CephDaemon {
    let id = idgen::random_id(6);
    let daemon_type = daemon_cluster.spec.daemon_type.to_string();

    let mut daemon_labels: BTreeMap<String, String> = BTreeMap::new();
    daemon_labels.insert(labels::CLUSTER_NAME.to_string(), daemon_cluster.spec.cluster_name.clone());
    daemon_labels.insert(labels::DAEMON_TYPE.to_string(), daemon_type.clone());

    let mut meta = ObjectMeta {
        name: Some(format!("ceph-{}-{daemon_type}-{id}", daemon_cluster.spec.cluster_name)),
        namespace: daemon_cluster.namespace(),
        labels: Some(daemon_labels),
        ..Default::default()
    };
    set_owner(&mut meta, daemon_cluster);

    CephDaemon {
        metadata: meta,
        spec: ceph_types::CephDaemonSpec {
            cluster_name: daemon_cluster.spec.cluster_name.clone(),
            id,
            image: daemon_cluster.spec.image.clone(),
            daemon_type: daemon_cluster.spec.daemon_type,
            config_map_name: daemon_cluster.spec.config_map_name.clone(),
            disabled: false,
        },
        status: None,
    }
}

/// Picks a uniformly random existing Daemon to delete on scale-down;
/// determinism is explicitly not a goal (spec.md 4.4).
pub fn pick_scale_down<'a>(daemons: &'a [CephDaemon]) -> Option<&'a CephDaemon> {
    if daemons.is_empty() {
        return None;
    }
    daemons.get(idgen::random_index(daemons.len()))
}
