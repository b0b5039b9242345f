use std::collections::BTreeMap;

use ceph_types::{CephOsd, labels};
use k8s_openapi::api::core::v1::{
    Container, EnvVar, EnvVarSource, ObjectFieldSelector, PersistentVolumeClaim,
    PersistentVolumeClaimSpec, Pod, PodSpec, ResourceRequirements, Volume, VolumeMount,
    VolumeResourceRequirements,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use kube::ResourceExt;

use crate::util::owner::set_owner;

pub fn pvc_name(cluster: &str, id: u32) -> String {
    format!("ceph-{cluster}-osd.{id}-data")
}

pub fn pod_name(cluster: &str, id: u32) -> String {
    format!("ceph-{cluster}-osd.{id}")
}

/// 100000-byte block-mode PVC, selector parsed verbatim from the OSD spec.
pub fn pvc_resource(osd: &CephOsd, cluster: &str, selector: LabelSelector) -> PersistentVolumeClaim {
    let mut labels: BTreeMap<String, String> = BTreeMap::new();
    labels.insert(labels::CLUSTER_NAME.to_string(), cluster.to_string());
    labels.insert(labels::DAEMON_TYPE.to_string(), "osd".to_string());

    let mut meta = ObjectMeta {
        name: Some(pvc_name(cluster, osd.spec.id)),
        namespace: osd.namespace(),
        labels: Some(labels),
        ..Default::default()
    };
    set_owner(&mut meta, osd);

    PersistentVolumeClaim {
        metadata: meta,
        spec: Some(PersistentVolumeClaimSpec {
            access_modes: Some(vec!["ReadWriteOnce".to_string()]),
            volume_mode: Some("Block".to_string()),
            storage_class_name: Some("local-storage".to_string()),
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

pub fn pod_resource(osd: &CephOsd, cluster: &str, image: &str, config_map_name: &str) -> Pod {
    let mut labels: BTreeMap<String, String> = BTreeMap::new();
    labels.insert(labels::CLUSTER_NAME.to_string(), cluster.to_string());
    labels.insert(labels::DAEMON_TYPE.to_string(), "osd".to_string());

    let mut meta = ObjectMeta {
        name: Some(pod_name(cluster, osd.spec.id)),
        namespace: osd.namespace(),
        labels: Some(labels),
        ..Default::default()
    };
    set_owner(&mut meta, osd);

    Pod {
        metadata: meta,
        spec: Some(PodSpec {
            service_account_name: Some("ceph-operator-osd".to_string()),
            containers: vec![Container {
                name: "osd".to_string(),
                image: Some(image.to_string()),
                env: Some(vec![
                    EnvVar {
                        name: "CMD".to_string(),
                        value: Some("start_osd".to_string()),
                        ..Default::default()
                    },
                    EnvVar {
                        name: "NODE_NAME".to_string(),
                        value_from: Some(EnvVarSource {
                            field_ref: Some(ObjectFieldSelector {
                                field_path: "spec.nodeName".to_string(),
                                ..Default::default()
                            }),
                            ..Default::default()
                        }),
                        ..Default::default()
                    },
                ]),
                volume_mounts: Some(vec![
                    VolumeMount {
                        name: "osd-data".to_string(),
                        device_path: Some("/dev/osd".to_string()),
                        ..Default::default()
                    },
                    VolumeMount {
                        name: "ceph-conf".to_string(),
                        mount_path: "/etc/ceph".to_string(),
                        ..Default::default()
                    },
                ]),
                resources: Some(ResourceRequirements::default()),
                ..Default::default()
            }],
            volumes: Some(vec![
                Volume {
                    name: "osd-data".to_string(),
                    persistent_volume_claim: Some(
                        k8s_openapi::api::core::v1::PersistentVolumeClaimVolumeSource {
                            claim_name: pvc_name(cluster, osd.spec.id),
                            ..Default::default()
                        },
                    ),
                    ..Default::default()
                },
                Volume {
                    name: "ceph-conf".to_string(),
                    config_map: Some(k8s_openapi::api::core::v1::ConfigMapVolumeSource {
                        name: config_map_name.to_string(),
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
