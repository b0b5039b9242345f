use std::collections::BTreeMap;

use ceph_types::{CephCluster, CephDaemonCluster, CephMonCluster, DaemonType, labels};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::{Api, Client, ResourceExt, api::Patch};

use crate::util::{Error, MANAGER_NAME, owner::set_owner, resources};

pub fn mon_cluster_name(cluster_name: &str) -> String {
    format!("{cluster_name}-mon")
}

pub fn daemon_cluster_name(cluster_name: &str, daemon_type: DaemonType) -> String {
    format!("{cluster_name}-{daemon_type}")
}

fn mon_cluster_resource(cluster: &CephCluster) -> CephMonCluster {
    let name = cluster.name_any();
    let mut cluster_labels = BTreeMap::new();
    cluster_labels.insert(labels::CLUSTER_NAME.to_string(), name.clone());

    let mut meta = ObjectMeta {
        name: Some(mon_cluster_name(&name)),
        namespace: cluster.namespace(),
        labels: Some(cluster_labels),
        ..Default::default()
    };
    set_owner(&mut meta, cluster);

    CephMonCluster {
        metadata: meta,
        spec: ceph_types::CephMonClusterSpec {
            cluster_name: name,
            image: cluster.spec.mon_image.clone(),
        },
        status: None,
    }
}

fn worker_daemon_cluster_resource(cluster: &CephCluster, daemon_type: DaemonType, image: String) -> CephDaemonCluster {
    let name = cluster.name_any();
    let mut cluster_labels = BTreeMap::new();
    cluster_labels.insert(labels::CLUSTER_NAME.to_string(), name.clone());
    cluster_labels.insert(labels::DAEMON_TYPE.to_string(), daemon_type.to_string());

    let mut meta = ObjectMeta {
        name: Some(daemon_cluster_name(&name, daemon_type)),
        namespace: cluster.namespace(),
        labels: Some(cluster_labels),
        ..Default::default()
    };
    set_owner(&mut meta, cluster);

    CephDaemonCluster {
        metadata: meta,
        spec: ceph_types::CephDaemonClusterSpec {
            cluster_name: name.clone(),
            daemon_type,
            image,
            config_map_name: resources::ceph_conf_configmap_name(&name),
            disabled: false,
            replicas: 1,
        },
        status: None,
    }
}

/// Ensures the singleton MonCluster exists, creating it on first sight and
/// refreshing only `image` on subsequent reconciles, per spec.md 4.1 item 3
/// ("each with the current cluster's image selections... owner reference,
/// and labels").
pub async fn ensure_mon_cluster(client: Client, namespace: &str, cluster: &CephCluster) -> Result<(), Error> {
    let api: Api<CephMonCluster> = Api::namespaced(client, namespace);
    let name = mon_cluster_name(&cluster.name_any());
    let desired = mon_cluster_resource(cluster);

    match api.get_opt(&name).await? {
        None => {
            api.create(&Default::default(), &desired).await?;
        }
        Some(_) => {
            let patch = serde_json::json!({ "spec": { "image": desired.spec.image } });
            api.patch(&name, &kube::api::PatchParams::apply(MANAGER_NAME), &Patch::Merge(&patch))
                .await?;
        }
    }
    Ok(())
}

/// Ensures one DaemonCluster exists for the given worker daemon-type,
/// refreshing only `image`/`configMapName` on subsequent reconciles so an
/// administrator's `replicas`/`disabled` edits on the object survive.
pub async fn ensure_daemon_cluster(
    client: Client,
    namespace: &str,
    cluster: &CephCluster,
    daemon_type: DaemonType,
    image: String,
) -> Result<(), Error> {
    let api: Api<CephDaemonCluster> = Api::namespaced(client, namespace);
    let name = daemon_cluster_name(&cluster.name_any(), daemon_type);
    let desired = worker_daemon_cluster_resource(cluster, daemon_type, image);

    match api.get_opt(&name).await? {
        None => {
            api.create(&Default::default(), &desired).await?;
        }
        Some(_) => {
            let patch = serde_json::json!({
                "spec": {
                    "image": desired.spec.image,
                    "configMapName": desired.spec.config_map_name,
                }
            });
            api.patch(&name, &kube::api::PatchParams::apply(MANAGER_NAME), &Patch::Merge(&patch))
                .await?;
        }
    }
    Ok(())
}
