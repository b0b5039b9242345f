use ceph_types::{CephCluster, CephOsd, labels};
use futures::stream::StreamExt;
use kube::{
    Api, ResourceExt,
    api::{Patch, PatchParams},
    client::Client,
    runtime::{Controller, controller::Action},
};
use kube_leader_election::{LeaseLock, LeaseLockParams, LeaseLockResult};
use owo_colors::OwoColorize;
use std::{collections::BTreeMap, sync::Arc};
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

use super::actions;
use crate::util::{Error, PROBE_INTERVAL, pods, selector::parse_selector};

pub async fn run(client: Client) -> Result<(), Error> {
    println!("{}", "⚙️ Starting Osd controller...".green());

    let context: Arc<ContextData> = Arc::new(ContextData::new(client.clone()));

    let lease_namespace = std::env::var("NAMESPACE").unwrap_or_else(|_| "default".to_string());
    let holder_id = std::env::var("POD_NAME")
        .or_else(|_| std::env::var("HOSTNAME"))
        .unwrap_or_else(|_| format!("ceph-osd-controller-{}", uuid::Uuid::new_v4()));
    let lease_name = "ceph-osd-controller-lock".to_string();
    let leadership = LeaseLock::new(
        client.clone(),
        &lease_namespace,
        LeaseLockParams {
            holder_id,
            lease_name,
            lease_ttl: Duration::from_secs(15),
        },
    );

    let shutdown = CancellationToken::new();
    let shutdown_signal = shutdown.clone();
    tokio::spawn(async move {
        ceph_common::shutdown::shutdown_signal().await;
        shutdown_signal.cancel();
    });

    let mut controller_task: Option<tokio::task::JoinHandle<()>> = None;
    let mut tick = tokio::time::interval(Duration::from_secs(5));
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                if let Some(task) = controller_task.take() {
                    task.abort();
                    task.await.ok();
                }
                break Ok(())
            },
            _ = tick.tick() => {}
        }
        let lease = match leadership.try_acquire_or_renew().await {
            Ok(l) => l,
            Err(e) => {
                eprintln!("leader election renew/acquire failed: {e}");
                if let Some(task) = controller_task.take() {
                    task.abort();
                }
                continue;
            }
        };
        if matches!(lease, LeaseLockResult::Acquired(_)) {
            if controller_task.is_none() {
                println!("{}", "👑 Acquired leadership; starting Osd controller".green());
                let client_for_controller = client.clone();
                let context_for_controller = context.clone();
                let controller_namespace = lease_namespace.clone();
                let crd_api: Api<CephOsd> =
                    Api::namespaced(client_for_controller.clone(), &controller_namespace);
                controller_task = Some(tokio::spawn(async move {
                    // Event mapper, spec.md 4.8: pod phase changes drive the
                    // running/stopped observation directly.
                    Controller::new(crd_api, Default::default())
                        .owns(
                            Api::<k8s_openapi::api::core::v1::Pod>::namespaced(
                                client_for_controller,
                                &controller_namespace,
                            ),
                            Default::default(),
                        )
                        .run(reconcile, on_error, context_for_controller)
                        .for_each(|_res| async move {})
                        .await;
                }));
            }
        } else if let Some(task) = controller_task.take() {
            task.abort();
        }
    }
}

struct ContextData {
    client: Client,
    #[cfg(feature = "metrics")]
    metrics: crate::util::metrics::ControllerMetrics,
}

impl ContextData {
    fn new(client: Client) -> Self {
        #[cfg(feature = "metrics")]
        {
            Self {
                client,
                metrics: crate::util::metrics::ControllerMetrics::new("cephosd"),
            }
        }
        #[cfg(not(feature = "metrics"))]
        {
            Self { client }
        }
    }
}

async fn reconcile(instance: Arc<CephOsd>, context: Arc<ContextData>) -> Result<Action, Error> {
    let client = context.client.clone();
    let namespace = instance
        .namespace()
        .ok_or_else(|| Error::UserInput("CephOsd must be namespaced".to_string()))?;
    let name = instance.name_any();

    #[cfg(feature = "metrics")]
    context
        .metrics
        .reconcile_counter
        .with_label_values(&[&name, &namespace])
        .inc();

    if ensure_labels(client.clone(), &namespace, &instance).await? {
        return Ok(Action::requeue(Duration::from_secs(1)));
    }

    let cluster_api: Api<CephCluster> = Api::namespaced(client.clone(), &namespace);
    let cluster = cluster_api.get_opt(&instance.spec.cluster_name).await?;
    let Some(cluster) = cluster else {
        return Ok(Action::requeue(PROBE_INTERVAL));
    };

    let osds_enabled = ceph_types::state::cluster_state::daemon_type_enabled(
        cluster.status.as_ref().map(|s| s.state).unwrap_or_default(),
        false,
        true,
    );

    let pod_name = actions::pod_name(&instance.spec.cluster_name, instance.spec.id);
    let existing_pod = pods::get_pod(client.clone(), &namespace, &pod_name).await?;

    if instance.spec.disabled || !osds_enabled {
        if existing_pod.is_some() {
            let api: Api<k8s_openapi::api::core::v1::Pod> = Api::namespaced(client, &namespace);
            let _ = api
                .delete(&pod_name, &Default::default())
                .await
                .or_else(|e| match e {
                    kube::Error::Api(ref ae) if ae.code == 404 => Ok(Default::default()),
                    other => Err(other),
                });
        }
        return Ok(Action::requeue(PROBE_INTERVAL));
    }

    if existing_pod.is_none() {
        let selector = parse_selector(&instance.spec.pv_selector)?;
        let pvc_api: Api<k8s_openapi::api::core::v1::PersistentVolumeClaim> =
            Api::namespaced(client.clone(), &namespace);
        let pvc = actions::pvc_resource(&instance, &instance.spec.cluster_name, selector);
        let _ = pvc_api
            .create(&Default::default(), &pvc)
            .await
            .or_else(|e| match e {
                kube::Error::Api(ref ae) if ae.code == 409 => Ok(pvc.clone()),
                other => Err(other),
            })?;

        let image = cluster.spec.osd_image.clone();
        let config_map_name = format!("ceph-{}-conf", instance.spec.cluster_name);
        let pod = actions::pod_resource(&instance, &instance.spec.cluster_name, &image, &config_map_name);
        let pod_api: Api<k8s_openapi::api::core::v1::Pod> = Api::namespaced(client, &namespace);
        let _ = pod_api
            .create(&Default::default(), &pod)
            .await
            .or_else(|e| match e {
                kube::Error::Api(ref ae) if ae.code == 409 => Ok(pod.clone()),
                other => Err(other),
            })?;
    }

    Ok(Action::requeue(PROBE_INTERVAL))
}

/// Label maintenance: the first action of every reconciler, per spec.md 4.8.
async fn ensure_labels(client: Client, namespace: &str, osd: &CephOsd) -> Result<bool, Error> {
    let mut desired: BTreeMap<String, String> = BTreeMap::new();
    desired.insert(labels::CLUSTER_NAME.to_string(), osd.spec.cluster_name.clone());
    desired.insert(labels::DAEMON_TYPE.to_string(), "osd".to_string());

    let current = osd.labels();
    if desired.iter().all(|(k, v)| current.get(k) == Some(v)) {
        return Ok(false);
    }

    let api: Api<CephOsd> = Api::namespaced(client, namespace);
    let patch = serde_json::json!({ "metadata": { "labels": desired } });
    api.patch(
        &osd.name_any(),
        &PatchParams::apply("ceph-operator"),
        &Patch::Merge(&patch),
    )
    .await?;
    Ok(true)
}

fn on_error(instance: Arc<CephOsd>, error: &Error, _context: Arc<ContextData>) -> Action {
    eprintln!(
        "{}",
        format!("CephOsd reconcile error: {:?} {:?}", error, instance.name_any()).red()
    );
    Action::requeue(Duration::from_secs(5))
}
