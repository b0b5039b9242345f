use std::collections::BTreeMap;

use ceph_types::{CephDaemon, keyring, labels};
use k8s_openapi::api::core::v1::{Container, EnvVar, Pod, PodSpec, ResourceRequirements, Volume, VolumeMount};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::ResourceExt;

use crate::util::owner::set_owner;

pub fn pod_name(cluster: &str, daemon_type: &str, id: &str) -> String {
    format!("ceph-{cluster}-{daemon_type}.{id}")
}

/// Base worker-daemon pod: ceph-conf volume, cluster env, plus the
/// type-specific `CMD`/`DAEMON_ID` environment and bootstrap keyring volume.
/// Identical shape for `mgr`/`mds`/`rgw`, tagged only by `daemon_type`, per
/// spec.md 4.5 and 9 ("a single state-transition function whose behavior
/// switches on the tag").
pub fn pod_resource(daemon: &CephDaemon, cluster: &str, image: &str, config_map_name: &str) -> Pod {
    let daemon_type = daemon.spec.daemon_type.to_string();
    let mut pod_labels: BTreeMap<String, String> = BTreeMap::new();
    pod_labels.insert(labels::CLUSTER_NAME.to_string(), cluster.to_string());
    pod_labels.insert(labels::DAEMON_TYPE.to_string(), daemon_type.clone());

    let mut meta = ObjectMeta {
        name: Some(pod_name(cluster, &daemon_type, &daemon.spec.id)),
        namespace: daemon.namespace(),
        labels: Some(pod_labels),
        ..Default::default()
    };
    set_owner(&mut meta, daemon);

    let bootstrap_entity = format!("client.bootstrap-{daemon_type}");
    let bootstrap_secret = keyring::secret_name_for(cluster, &bootstrap_entity);
    let bootstrap_volume = format!("bootstrap-{daemon_type}-keyring");

    Pod {
        metadata: meta,
        spec: Some(PodSpec {
            containers: vec![Container {
                name: daemon_type.clone(),
                image: Some(image.to_string()),
                env: Some(vec![
                    EnvVar {
                        name: "CMD".to_string(),
                        value: Some(format!("start_{daemon_type}")),
                        ..Default::default()
                    },
                    EnvVar {
                        name: "DAEMON_ID".to_string(),
                        value: Some(daemon.spec.id.clone()),
                        ..Default::default()
                    },
                    EnvVar {
                        name: "CLUSTER".to_string(),
                        value: Some(cluster.to_string()),
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
                        name: bootstrap_volume.clone(),
                        mount_path: format!("/keyrings/{bootstrap_entity}"),
                        ..Default::default()
                    },
                ]),
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
                    name: bootstrap_volume,
                    secret: Some(k8s_openapi::api::core::v1::SecretVolumeSource {
                        secret_name: Some(bootstrap_secret),
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
