use ceph_types::{
    CephCluster, CephClusterStatus, CephDaemonCluster, CephMonCluster, CephOsd, DaemonType,
    crd::{DaemonClusterState, MonClusterState},
    labels,
    state::cluster_state::{ClusterObservations, next_state},
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
use crate::util::{Error, HEALTH_INTERVAL, WAIT_INTERVAL, lists, patch, pods, resources};

pub async fn run(client: Client) -> Result<(), Error> {
    println!("{}", "⚙️ Starting Cluster controller...".green());

    let context: Arc<ContextData> = Arc::new(ContextData::new(client.clone()));

    let lease_namespace = std::env::var("NAMESPACE").unwrap_or_else(|_| "default".to_string());
    let holder_id = std::env::var("POD_NAME")
        .or_else(|_| std::env::var("HOSTNAME"))
        .unwrap_or_else(|_| format!("ceph-cluster-controller-{}", uuid::Uuid::new_v4()));
    let leadership = LeaseLock::new(
        client.clone(),
        &lease_namespace,
        LeaseLockParams {
            holder_id,
            lease_name: "ceph-cluster-controller-lock".to_string(),
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
                println!("{}", "👑 Acquired leadership; starting Cluster controller".green());
                let client_for_controller = client.clone();
                let context_for_controller = context.clone();
                let controller_namespace = lease_namespace.clone();
                let crd_api: Api<CephCluster> = Api::namespaced(client_for_controller.clone(), &controller_namespace);
                controller_task = Some(tokio::spawn(async move {
                    // Event mappers, spec.md 4.8: a change on either owned
                    // *-Cluster re-triggers this Cluster's reconcile, so
                    // status.state tracks MonCluster/DaemonCluster readiness
                    // without waiting out a full requeue interval.
                    Controller::new(crd_api, Default::default())
                        .owns(
                            Api::<CephMonCluster>::namespaced(client_for_controller.clone(), &controller_namespace),
                            Default::default(),
                        )
                        .owns(
                            Api::<CephDaemonCluster>::namespaced(client_for_controller, &controller_namespace),
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
                metrics: crate::util::metrics::ControllerMetrics::new("cephcluster"),
            }
        }
        #[cfg(not(feature = "metrics"))]
        {
            Self { client }
        }
    }
}

async fn reconcile(instance: Arc<CephCluster>, context: Arc<ContextData>) -> Result<Action, Error> {
    let client = context.client.clone();
    let namespace = instance
        .namespace()
        .ok_or_else(|| Error::UserInput("CephCluster must be namespaced".to_string()))?;
    let name = instance.name_any();

    #[cfg(feature = "metrics")]
    context
        .metrics
        .reconcile_counter
        .with_label_values(&[&name, &namespace])
        .inc();

    if ensure_labels(client.clone(), &namespace, &instance).await? {
        return Ok(Action::requeue(WAIT_INTERVAL));
    }

    // spec.md 4.1 item 1-2: the ceph.conf ConfigMap and the two monitor
    // Services are kept current on every reconcile regardless of state.
    let conf = resources::ceph_conf_configmap(&instance);
    patch::apply(client.clone(), &namespace, &conf.name_any(), &conf).await?;

    let svc = resources::monitor_service(&instance);
    patch::apply(client.clone(), &namespace, &svc.name_any(), &svc).await?;

    let discovery_svc = resources::monitor_discovery_service(&instance);
    patch::apply(client.clone(), &namespace, &discovery_svc.name_any(), &discovery_svc).await?;

    // spec.md 4.1 item 3: the singleton MonCluster plus mgr/mds DaemonClusters.
    actions::ensure_mon_cluster(client.clone(), &namespace, &instance).await?;
    actions::ensure_daemon_cluster(client.clone(), &namespace, &instance, DaemonType::Mgr, instance.spec.mgr_image.clone())
        .await?;
    actions::ensure_daemon_cluster(client.clone(), &namespace, &instance, DaemonType::Mds, instance.spec.mds_image.clone())
        .await?;

    let mon_clusters: Vec<CephMonCluster> = lists::list_by_cluster(client.clone(), &namespace, &name).await?;
    if mon_clusters.len() > 1 {
        return Err(Error::ProtocolViolation(format!(
            "expected exactly one CephMonCluster for cluster {name}, found {}",
            mon_clusters.len()
        )));
    }
    let mon_cluster_state = mon_clusters.first().and_then(|m| m.status.as_ref()).map(|s| s.state);

    let daemon_clusters: Vec<CephDaemonCluster> = lists::list_by_cluster(client.clone(), &namespace, &name).await?;
    let daemon_clusters_running = daemon_clusters
        .iter()
        .all(|d| d.status.as_ref().map(|s| s.state) == Some(DaemonClusterState::Running));
    let daemon_clusters_idle = daemon_clusters
        .iter()
        .all(|d| d.status.as_ref().map(|s| s.state).unwrap_or_default() == DaemonClusterState::Idle);

    let osds: Vec<CephOsd> = lists::list_by_cluster(client.clone(), &namespace, &name).await?;
    let mut osds_running = true;
    let mut osds_idle = true;
    for osd in osds.iter().filter(|o| !o.spec.disabled) {
        let pod_name = format!("ceph-{name}-osd.{}", osd.spec.id);
        match pods::get_pod(client.clone(), &namespace, &pod_name).await? {
            Some(pod) if pods::pod_running(&pod) && pods::pod_ready(&pod) => osds_idle = false,
            Some(_) => {
                osds_running = false;
                osds_idle = false;
            }
            None => osds_running = false,
        }
    }

    let obs = ClusterObservations {
        disabled: instance.spec.disabled,
        mon_cluster_in_quorum: mon_cluster_state == Some(MonClusterState::InQuorum),
        mon_cluster_idle: mon_cluster_state.unwrap_or(MonClusterState::Idle) == MonClusterState::Idle,
        daemon_clusters_running,
        daemon_clusters_idle,
        osds_running,
        osds_idle,
    };

    let current = instance.status.as_ref().map(|s| s.state).unwrap_or_default();
    let next = next_state(current, &obs);

    if next != current {
        patch::patch_status::<CephClusterStatus, CephCluster>(client.clone(), &instance, |status| {
            status.state = next;
        })
        .await?;
        return Ok(Action::requeue(WAIT_INTERVAL));
    }

    let requeue = if next == ceph_types::crd::ClusterState::Running { HEALTH_INTERVAL } else { WAIT_INTERVAL };
    Ok(Action::requeue(requeue))
}

async fn ensure_labels(client: Client, namespace: &str, cluster: &CephCluster) -> Result<bool, Error> {
    let mut desired: BTreeMap<String, String> = BTreeMap::new();
    desired.insert(labels::CLUSTER_NAME.to_string(), cluster.name_any());

    let current = cluster.labels();
    if desired.iter().all(|(k, v)| current.get(k) == Some(v)) {
        return Ok(false);
    }

    let api: Api<CephCluster> = Api::namespaced(client, namespace);
    let patch = serde_json::json!({ "metadata": { "labels": desired } });
    api.patch(&cluster.name_any(), &PatchParams::apply("ceph-operator"), &Patch::Merge(&patch))
        .await?;
    Ok(true)
}

fn on_error(instance: Arc<CephCluster>, error: &Error, _context: Arc<ContextData>) -> Action {
    eprintln!(
        "{}",
        format!("CephCluster reconcile error: {:?} {:?}", error, instance.name_any()).red()
    );
    Action::requeue(Duration::from_secs(5))
}
