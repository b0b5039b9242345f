use ceph_types::{
    CephCluster, CephDaemon, CephDaemonCluster, CephDaemonClusterStatus,
    crd::DaemonClusterState,
    state::{
        cluster_state::daemon_type_enabled,
        daemoncluster_state::{DaemonClusterObservations, next_state, scale_direction},
    },
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
use crate::util::{Error, HEALTH_INTERVAL, PROBE_INTERVAL, WAIT_INTERVAL, lists, patch};

pub async fn run(client: Client) -> Result<(), Error> {
    println!("{}", "⚙️ Starting DaemonCluster controller...".green());

    let context: Arc<ContextData> = Arc::new(ContextData::new(client.clone()));

    let lease_namespace = std::env::var("NAMESPACE").unwrap_or_else(|_| "default".to_string());
    let holder_id = std::env::var("POD_NAME")
        .or_else(|_| std::env::var("HOSTNAME"))
        .unwrap_or_else(|_| format!("ceph-daemoncluster-controller-{}", uuid::Uuid::new_v4()));
    let leadership = LeaseLock::new(
        client.clone(),
        &lease_namespace,
        LeaseLockParams {
            holder_id,
            lease_name: "ceph-daemoncluster-controller-lock".to_string(),
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
                println!("{}", "👑 Acquired leadership; starting DaemonCluster controller".green());
                let client_for_controller = client.clone();
                let context_for_controller = context.clone();
                let controller_namespace = lease_namespace.clone();
                let crd_api: Api<CephDaemonCluster> =
                    Api::namespaced(client_for_controller.clone(), &controller_namespace);
                controller_task = Some(tokio::spawn(async move {
                    // Event mapper, spec.md 4.8: a Daemon created or deleted
                    // out from under this DaemonCluster (scale commands take
                    // effect one reconcile at a time) re-triggers reconcile
                    // so the replica count is re-checked promptly.
                    Controller::new(crd_api, Default::default())
                        .owns(
                            Api::<CephDaemon>::namespaced(client_for_controller, &controller_namespace),
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
                metrics: crate::util::metrics::ControllerMetrics::new("cephdaemoncluster"),
            }
        }
        #[cfg(not(feature = "metrics"))]
        {
            Self { client }
        }
    }
}

async fn reconcile(instance: Arc<CephDaemonCluster>, context: Arc<ContextData>) -> Result<Action, Error> {
    let client = context.client.clone();
    let namespace = instance
        .namespace()
        .ok_or_else(|| Error::UserInput("CephDaemonCluster must be namespaced".to_string()))?;
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

    let cluster_allows = daemon_type_enabled(cluster.status.as_ref().map(|s| s.state).unwrap_or_default(), false, false);
    let enabled = !instance.spec.disabled && cluster_allows;

    let daemons: Vec<CephDaemon> = lists::list_by_cluster_and_type(
        client.clone(),
        &namespace,
        &instance.spec.cluster_name,
        &daemon_type,
    )
    .await?;

    let obs = DaemonClusterObservations {
        enabled,
        current_count: daemons.len() as u32,
        desired_count: instance.spec.replicas,
        list_failed: false,
    };

    let current = instance.status.as_ref().map(|s| s.state).unwrap_or_default();
    let next = next_state(current, &obs);

    if current == DaemonClusterState::Scaling {
        match scale_direction(&obs) {
            Some(true) => {
                let daemon = actions::daemon_resource(&instance);
                let daemon_api: Api<CephDaemon> = Api::namespaced(client.clone(), &namespace);
                daemon_api
                    .create(&Default::default(), &daemon)
                    .await
                    .or_else(|e| match e {
                        kube::Error::Api(ref ae) if ae.code == 409 => Ok(daemon.clone()),
                        other => Err(other),
                    })?;
            }
            Some(false) => {
                if let Some(victim) = actions::pick_scale_down(&daemons) {
                    let daemon_api: Api<CephDaemon> = Api::namespaced(client.clone(), &namespace);
                    daemon_api
                        .delete(&victim.name_any(), &Default::default())
                        .await
                        .or_else(|e| match e {
                            kube::Error::Api(ref ae) if ae.code == 404 => Ok(Default::default()),
                            other => Err(other),
                        })?;
                }
            }
            None => {}
        }
    }

    if next != current {
        patch::patch_status::<CephDaemonClusterStatus, CephDaemonCluster>(client.clone(), &instance, |status| {
            status.state = next;
        })
        .await?;
        return Ok(Action::requeue(WAIT_INTERVAL));
    }

    let requeue = if next == DaemonClusterState::Running { HEALTH_INTERVAL } else { WAIT_INTERVAL };
    Ok(Action::requeue(requeue))
}

async fn ensure_labels(
    client: Client,
    namespace: &str,
    daemon_cluster: &CephDaemonCluster,
    daemon_type: &str,
) -> Result<bool, Error> {
    let mut desired: BTreeMap<String, String> = BTreeMap::new();
    desired.insert(
        ceph_types::labels::CLUSTER_NAME.to_string(),
        daemon_cluster.spec.cluster_name.clone(),
    );
    desired.insert(ceph_types::labels::DAEMON_TYPE.to_string(), daemon_type.to_string());

    let current = daemon_cluster.labels();
    if desired.iter().all(|(k, v)| current.get(k) == Some(v)) {
        return Ok(false);
    }

    let api: Api<CephDaemonCluster> = Api::namespaced(client, namespace);
    let patch = serde_json::json!({ "metadata": { "labels": desired } });
    api.patch(
        &daemon_cluster.name_any(),
        &PatchParams::apply("ceph-operator"),
        &Patch::Merge(&patch),
    )
    .await?;
    Ok(true)
}

fn on_error(instance: Arc<CephDaemonCluster>, error: &Error, _context: Arc<ContextData>) -> Action {
    eprintln!(
        "{}",
        format!("CephDaemonCluster reconcile error: {:?} {:?}", error, instance.name_any()).red()
    );
    Action::requeue(Duration::from_secs(5))
}
