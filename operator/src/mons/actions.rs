use std::collections::BTreeMap;

use ceph_types::{CephMon, keyring, labels};
use k8s_openapi::api::core::v1::{
    Container, EnvVar, EnvVarSource, ExecAction, ObjectFieldSelector, PersistentVolumeClaim,
    PersistentVolumeClaimSpec, Pod, PodSpec, Probe, ResourceRequirements, Volume, VolumeMount,
    VolumeResourceRequirements,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use kube::ResourceExt;

use crate::util::owner::set_owner;

pub fn pod_name(mon_name: &str) -> String {
    format!("ceph-{mon_name}")
}

pub fn pvc_name(mon_name: &str) -> String {
    format!("ceph-{mon_name}-data")
}

/// Filesystem-mode, ReadWriteOnce PVC for a monitor's data directory.
pub fn pvc_resource(mon: &CephMon, cluster: &str, selector: LabelSelector) -> PersistentVolumeClaim {
    let mon_name = mon.name_any();
    let mut pod_labels: BTreeMap<String, String> = BTreeMap::new();
    pod_labels.insert(labels::CLUSTER_NAME.to_string(), cluster.to_string());
    pod_labels.insert(labels::DAEMON_TYPE.to_string(), "mon".to_string());

    let mut meta = ObjectMeta {
        name: Some(pvc_name(&mon_name)),
        namespace: mon.namespace(),
        labels: Some(pod_labels),
        ..Default::default()
    };
    set_owner(&mut meta, mon);

    PersistentVolumeClaim {
        metadata: meta,
        spec: Some(PersistentVolumeClaimSpec {
            access_modes: Some(vec!["ReadWriteOnce".to_string()]),
            selector: Some(selector),
            resources: Some(VolumeResourceRequirements {
                requests: Some(BTreeMap::from([(
                    "storage".to_string(),
                    Quantity("100000".to_string()),
                )])),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// A monitor pod: ceph-conf, mon-data PVC, monmap ConfigMap, and the
/// `client.admin` keyring Secret, with a `mon_health.sh` exec probe, per
/// spec.md 4.3.
#[allow(clippy::too_many_arguments)]
pub fn pod_resource(
    mon: &CephMon,
    cluster: &str,
    mon_service_name: &str,
    image: &str,
    config_map_name: &str,
    monmap_config_map_name: &str,
    start_epoch: u64,
) -> Pod {
    let mon_name = mon.name_any();
    let mut pod_labels: BTreeMap<String, String> = BTreeMap::new();
    pod_labels.insert(labels::CLUSTER_NAME.to_string(), cluster.to_string());
    pod_labels.insert(labels::DAEMON_TYPE.to_string(), "mon".to_string());
    pod_labels.insert(labels::MONITOR_SERVICE.to_string(), mon_service_name.to_string());

    let mut meta = ObjectMeta {
        name: Some(pod_name(&mon_name)),
        namespace: mon.namespace(),
        labels: Some(pod_labels),
        ..Default::default()
    };
    set_owner(&mut meta, mon);

    let health_probe = Probe {
        exec: Some(ExecAction {
            command: Some(vec!["mon_health.sh".to_string()]),
        }),
        ..Default::default()
    };

    Pod {
        metadata: meta,
        spec: Some(PodSpec {
            containers: vec![Container {
                name: "mon".to_string(),
                image: Some(image.to_string()),
                env: Some(vec![
                    EnvVar {
                        name: "CMD".to_string(),
                        value: Some("start_mon".to_string()),
                        ..Default::default()
                    },
                    EnvVar {
                        name: "MON_IP".to_string(),
                        value_from: Some(EnvVarSource {
                            field_ref: Some(ObjectFieldSelector {
                                field_path: "status.podIP".to_string(),
                                ..Default::default()
                            }),
                            ..Default::default()
                        }),
                        ..Default::default()
                    },
                    EnvVar {
                        name: "MON_ID".to_string(),
                        value: Some(mon.spec.id.clone()),
                        ..Default::default()
                    },
                    EnvVar {
                        name: "CLUSTER".to_string(),
                        value: Some(cluster.to_string()),
                        ..Default::default()
                    },
                    EnvVar {
                        name: "MON_CLUSTER_START_EPOCH".to_string(),
                        value: Some(start_epoch.to_string()),
                        ..Default::default()
                    },
                ]),
                volume_mounts: Some(vec![
                    VolumeMount {
                        name: "ceph-conf".to_string(),
                        mount_path: "/etc/ceph".to_string(),
                        ..Default::default()
                    },
                    VolumeMount {
                        name: "mon-data".to_string(),
                        mount_path: "/var/lib/ceph/mon".to_string(),
                        ..Default::default()
                    },
                    VolumeMount {
                        name: "monmap".to_string(),
                        mount_path: "/etc/ceph/monmap".to_string(),
                        ..Default::default()
                    },
                    VolumeMount {
                        name: "client-admin-keyring".to_string(),
                        mount_path: "/keyrings/client.admin".to_string(),
                        ..Default::default()
                    },
                ]),
                readiness_probe: Some(health_probe.clone()),
                liveness_probe: Some(health_probe),
                resources: Some(ResourceRequirements::default()),
                ..Default::default()
            }],
            volumes: Some(vec![
                Volume {
                    name: "ceph-conf".to_string(),
                    config_map: Some(k8s_openapi::api::core::v1::ConfigMapVolumeSource {
                        name: config_map_name.to_string(),
                        ..Default::default()
                    }),
                    ..Default::default()
                },
                Volume {
                    name: "mon-data".to_string(),
                    persistent_volume_claim: Some(
                        k8s_openapi::api::core::v1::PersistentVolumeClaimVolumeSource {
                            claim_name: pvc_name(&mon_name),
                            ..Default::default()
                        },
                    ),
                    ..Default::default()
                },
                Volume {
                    name: "monmap".to_string(),
                    config_map: Some(k8s_openapi::api::core::v1::ConfigMapVolumeSource {
                        name: monmap_config_map_name.to_string(),
                        ..Default::default()
                    }),
                    ..Default::default()
                },
                Volume {
                    name: "client-admin-keyring".to_string(),
                    secret: Some(k8s_openapi::api::core::v1::SecretVolumeSource {
                        secret_name: Some(keyring::secret_name_for(cluster, "client.admin")),
                        ..Default::default()
                    }),
                    ..Default::default()
                },
            ]),
            ..Default::default()
        }),
        ..Default::default()
    }
}
