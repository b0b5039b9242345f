use std::collections::BTreeMap;

use ceph_types::{CephCluster, CephMonCluster, cephconf, labels, monmap::MonMap};
use k8s_openapi::api::core::v1::{ConfigMap, Service, ServicePort, ServiceSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::ResourceExt;
use serde::Serialize;

use super::owner::set_owner;

pub fn ceph_conf_configmap_name(cluster: &str) -> String {
    format!("ceph-{cluster}-conf")
}

pub fn ceph_conf_key(cluster: &str) -> String {
    format!("{cluster}.conf")
}

/// Builds the Ceph configuration ConfigMap described in spec.md 4.1 item 1:
/// one entry, `<cluster-name>.conf`, holding the rendered INI document.
pub fn ceph_conf_configmap(cluster: &CephCluster) -> ConfigMap {
    let name = cluster.name_any();
    let mut labels_map = BTreeMap::new();
    labels_map.insert(labels::CLUSTER_NAME.to_string(), name.clone());

    let mut meta = ObjectMeta {
        name: Some(ceph_conf_configmap_name(&name)),
        namespace: cluster.namespace(),
        labels: Some(labels_map),
        ..Default::default()
    };
    set_owner(&mut meta, cluster);

    let rendered = cephconf::render(&cluster.spec.fsid, &cluster.spec.mon_service_name, &cluster.spec.config);
    let mut data = BTreeMap::new();
    data.insert(ceph_conf_key(&name), rendered);

    ConfigMap {
        metadata: meta,
        data: Some(data),
        ..Default::default()
    }
}

/// The headless monitor Service: selects every mon pod by
/// `(daemon-type=mon, monitor-service=<name>)`, port 6789.
pub fn monitor_service(cluster: &CephCluster) -> Service {
    let name = cluster.name_any();
    let mut meta_labels = BTreeMap::new();
    meta_labels.insert(labels::CLUSTER_NAME.to_string(), name.clone());

    let mut meta = ObjectMeta {
        name: Some(cluster.spec.mon_service_name.clone()),
        namespace: cluster.namespace(),
        labels: Some(meta_labels),
        ..Default::default()
    };
    set_owner(&mut meta, cluster);

    Service {
        metadata: meta,
        spec: Some(service_spec(&name, &cluster.spec.mon_service_name, false)),
        ..Default::default()
    }
}

/// The discovery Service: identical selector, but publishes not-ready
/// addresses so DNS resolves newly-started monitors before readiness
/// (spec.md 4.1 item 2).
pub fn monitor_discovery_service(cluster: &CephCluster) -> Service {
    let name = cluster.name_any();
    let mut meta_labels = BTreeMap::new();
    meta_labels.insert(labels::CLUSTER_NAME.to_string(), name.clone());

    let mut meta = ObjectMeta {
        name: Some(format!("{}-discovery", cluster.spec.mon_service_name)),
        namespace: cluster.namespace(),
        labels: Some(meta_labels),
        ..Default::default()
    };
    set_owner(&mut meta, cluster);

    Service {
        metadata: meta,
        spec: Some(service_spec(&name, &cluster.spec.mon_service_name, true)),
        ..Default::default()
    }
}

fn service_spec(_cluster: &str, mon_service_name: &str, publish_not_ready: bool) -> ServiceSpec {
    let mut selector = BTreeMap::new();
    selector.insert(labels::DAEMON_TYPE.to_string(), "mon".to_string());
    selector.insert(labels::MONITOR_SERVICE.to_string(), mon_service_name.to_string());

    ServiceSpec {
        cluster_ip: Some("None".to_string()),
        selector: Some(selector),
        publish_not_ready_addresses: Some(publish_not_ready),
        ports: Some(vec![ServicePort {
            name: Some("mon".to_string()),
            port: 6789,
            ..Default::default()
        }]),
        ..Default::default()
    }
}

pub fn monmap_configmap_name(mon_cluster_name: &str) -> String {
    format!("{mon_cluster_name}-monmap")
}

#[derive(Serialize)]
struct JsonMonMapEntry {
    id: String,
    ip: Option<String>,
    port: u16,
}

#[derive(Serialize)]
struct JsonMonMap {
    #[serde(rename = "startEpoch")]
    start_epoch: u64,
    #[serde(rename = "monMap")]
    mon_map: Vec<JsonMonMapEntry>,
}

/// Publishes `<monCluster-name>-monmap` holding `jsonMonMap`: the initial
/// submap only, per spec.md 4.2.
pub fn monmap_configmap(mon_cluster: &CephMonCluster, initial: &MonMap) -> ConfigMap {
    let name = mon_cluster.name_any();
    let mut labels_map = BTreeMap::new();
    labels_map.insert(labels::CLUSTER_NAME.to_string(), mon_cluster.spec.cluster_name.clone());

    let mut meta = ObjectMeta {
        name: Some(monmap_configmap_name(&name)),
        namespace: mon_cluster.namespace(),
        labels: Some(labels_map),
        ..Default::default()
    };
    set_owner(&mut meta, mon_cluster);

    let json_map = JsonMonMap {
        start_epoch: mon_cluster.status.as_ref().map(|s| s.start_epoch).unwrap_or(0),
        mon_map: initial
            .values()
            .map(|e| JsonMonMapEntry {
                id: e.id.clone(),
                ip: e.pod_ip.clone(),
                port: e.port,
            })
            .collect(),
    };

    let mut data = BTreeMap::new();
    data.insert(
        "jsonMonMap".to_string(),
        serde_json::to_string(&json_map).expect("JsonMonMap always serializes"),
    );

    ConfigMap {
        metadata: meta,
        data: Some(data),
        ..Default::default()
    }
}
