use ceph_types::{
    CephCluster, CephDaemon, CephDaemonCluster, CephDaemonStatus,
    crd::DaemonState,
    state::daemon_state::{DaemonObservations, next_state},
};
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
use crate::util::{Error, HEALTH_INTERVAL, PROBE_INTERVAL, WAIT_INTERVAL, lists, patch, pods, resources};

pub async fn run(client: Client) -> Result<(), Error> {
    println!("{}", "⚙️ Starting Daemon controller...".green());

    let context: Arc<ContextData> = Arc::new(ContextData::new(client.clone()));

    let lease_namespace = std::env::var("NAMESPACE").unwrap_or_else(|_| "default".to_string());
    let holder_id = std::env::var("POD_NAME")
        .or_else(|_| std::env::var("HOSTNAME"))
        .unwrap_or_else(|_| format!("ceph-daemon-controller-{}", uuid::Uuid::new_v4()));
    let leadership = LeaseLock::new(
        client.clone(),
        &lease_namespace,
        LeaseLockParams {
            holder_id,
            lease_name: "ceph-daemon-controller-lock".to_string(),
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
                println!("{}", "👑 Acquired leadership; starting Daemon controller".green());
                let client_for_controller = client.clone();
                let context_for_controller = context.clone();
                let controller_namespace = lease_namespace.clone();
                let crd_api: Api<CephDaemon> =
                    Api::namespaced(client_for_controller.clone(), &controller_namespace);
                controller_task = Some(tokio::spawn(async move {
                    // Event mapper, spec.md 4.8: pod phase/readiness changes
                    // drive WaitForRun/WaitForReady/Ready directly rather
                    // than waiting out a requeue interval.
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
                metrics: crate::util::metrics::ControllerMetrics::new("cephdaemon"),
            }
        }
        #[cfg(not(feature = "metrics"))]
        {
            Self { client }
        }
    }
}

async fn reconcile(instance: Arc<CephDaemon>, context: Arc<ContextData>) -> Result<Action, Error> {
    let client = context.client.clone();
    let namespace = instance
        .namespace()
        .ok_or_else(|| Error::UserInput("CephDaemon must be namespaced".to_string()))?;
    let name = instance.name_any();

    #[cfg(feature = "metrics")]
    context
        .metrics
        .reconcile_counter
        .with_label_values(&[&name, &namespace])
        .inc();

    let daemon_type = instance.spec.daemon_type.to_string();

    if ensure_labels(client.clone(), &namespace, &instance, &daemon_type).await? {
        return Ok(Action::requeue(WAIT_INTERVAL));
    }

    let cluster_api: Api<CephCluster> = Api::namespaced(client.clone(), &namespace);
    let Some(cluster) = cluster_api.get_opt(&instance.spec.cluster_name).await? else {
        return Ok(Action::requeue(PROBE_INTERVAL));
    };

    let daemon_clusters: Vec<CephDaemonCluster> = lists::list_by_cluster_and_type(
        client.clone(),
        &namespace,
        &instance.spec.cluster_name,
        &daemon_type,
    )
    .await?;
    if daemon_clusters.len() > 1 {
        return Err(Error::ProtocolViolation(format!(
            "{} DaemonClusters found for ({}, {daemon_type})",
            daemon_clusters.len(),
            instance.spec.cluster_name
        )));
    }
    let daemon_cluster = daemon_clusters.into_iter().next();

    let pod_name = actions::pod_name(&instance.spec.cluster_name, &daemon_type, &instance.spec.id);
    let existing_pod = pods::get_pod(client.clone(), &namespace, &pod_name).await?;

    let current = instance.status.as_ref().map(|s| s.state).unwrap_or_default();
    let obs = DaemonObservations {
        disabled: instance.spec.disabled,
        daemon_cluster_state: daemon_cluster.as_ref().and_then(|dc| dc.status.as_ref()).map(|s| s.state),
        pod_exists: existing_pod.is_some(),
        pod_running: existing_pod.as_ref().map(pods::pod_running).unwrap_or(false),
        pod_ready: existing_pod.as_ref().map(pods::pod_ready).unwrap_or(false),
    };

    let next = next_state(current, &obs);

    if current == DaemonState::Launching && existing_pod.is_none() {
        let config_map_name = resources::ceph_conf_configmap_name(&instance.spec.cluster_name);
        let image = match daemon_type.as_str() {
            "mgr" => cluster.spec.mgr_image.clone(),
            "mds" => cluster.spec.mds_image.clone(),
            _ => daemon_cluster.as_ref().map(|dc| dc.spec.image.clone()).unwrap_or_default(),
        };
        let pod = actions::pod_resource(&instance, &instance.spec.cluster_name, &image, &config_map_name);
        let pod_api: Api<k8s_openapi::api::core::v1::Pod> = Api::namespaced(client.clone(), &namespace);
        pod_api
            .create(&Default::default(), &pod)
            .await
            .or_else(|e| match e {
                kube::Error::Api(ref ae) if ae.code == 409 => Ok(pod.clone()),
                other => Err(other),
            })?;
    }

    if current == DaemonState::Cleanup && existing_pod.is_some() {
        let pod_api: Api<k8s_openapi::api::core::v1::Pod> = Api::namespaced(client.clone(), &namespace);
        pod_api
            .delete(&pod_name, &Default::default())
            .await
            .or_else(|e| match e {
                kube::Error::Api(ref ae) if ae.code == 404 => Ok(Default::default()),
                other => Err(other),
            })?;
    }

    if next != current {
        patch::patch_status::<CephDaemonStatus, CephDaemon>(client.clone(), &instance, |status| {
            status.state = next;
        })
        .await?;
        return Ok(Action::requeue(WAIT_INTERVAL));
    }

    let requeue = if next == DaemonState::Ready { HEALTH_INTERVAL } else { WAIT_INTERVAL };
    Ok(Action::requeue(requeue))
}

async fn ensure_labels(
    client: Client,
    namespace: &str,
    daemon: &CephDaemon,
    daemon_type: &str,
) -> Result<bool, Error> {
    let mut desired: BTreeMap<String, String> = BTreeMap::new();
    desired.insert(ceph_types::labels::CLUSTER_NAME.to_string(), daemon.spec.cluster_name.clone());
    desired.insert(ceph_types::labels::DAEMON_TYPE.to_string(), daemon_type.to_string());

    let current = daemon.labels();
    if desired.iter().all(|(k, v)| current.get(k) == Some(v)) {
        return Ok(false);
    }

    let api: Api<CephDaemon> = Api::namespaced(client, namespace);
    let patch = serde_json::json!({ "metadata": { "labels": desired } });
    api.patch(
        &daemon.name_any(),
        &PatchParams::apply("ceph-operator"),
        &Patch::Merge(&patch),
    )
    .await?;
    Ok(true)
}

fn on_error(instance: Arc<CephDaemon>, error: &Error, _context: Arc<ContextData>) -> Action {
    eprintln!(
        "{}",
        format!("CephDaemon reconcile error: {:?} {:?}", error, instance.name_any()).red()
    );
    Action::requeue(Duration::from_secs(5))
}
