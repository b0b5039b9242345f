use ceph_types::{
    CephCluster, CephMon, CephMonCluster, CephMonClusterStatus,
    crd::MonClusterState,
    monmap,
    state::{cluster_state::daemon_type_enabled, moncluster_state::{MonClusterObservations, increments_epoch, next_state}},
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
use crate::util::{Error, HEALTH_INTERVAL, WAIT_INTERVAL, lists, patch, resources};

pub async fn run(client: Client) -> Result<(), Error> {
    println!("{}", "⚙️ Starting MonCluster controller...".green());

    let context: Arc<ContextData> = Arc::new(ContextData::new(client.clone()));

    let lease_namespace = std::env::var("NAMESPACE").unwrap_or_else(|_| "default".to_string());
    let holder_id = std::env::var("POD_NAME")
        .or_else(|_| std::env::var("HOSTNAME"))
        .unwrap_or_else(|_| format!("ceph-moncluster-controller-{}", uuid::Uuid::new_v4()));
    let leadership = LeaseLock::new(
        client.clone(),
        &lease_namespace,
        LeaseLockParams {
            holder_id,
            lease_name: "ceph-moncluster-controller-lock".to_string(),
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
                println!("{}", "👑 Acquired leadership; starting MonCluster controller".green());
                let client_for_controller = client.clone();
                let context_for_controller = context.clone();
                let controller_namespace = lease_namespace.clone();
                let crd_api: Api<CephMonCluster> =
                    Api::namespaced(client_for_controller.clone(), &controller_namespace);
                controller_task = Some(tokio::spawn(async move {
                    // Event mapper, spec.md 4.8: keyring/monmap Secret and
                    // ConfigMap churn re-triggers reconcile promptly. Mons
                    // themselves aren't owned by MonCluster (they're
                    // author-declared, like Osds) so their state changes are
                    // picked up on the next WAIT_INTERVAL tick rather than a
                    // watch — see DESIGN.md.
                    Controller::new(crd_api, Default::default())
                        .owns(
                            Api::<k8s_openapi::api::core::v1::Secret>::namespaced(
                                client_for_controller.clone(),
                                &controller_namespace,
                            ),
                            Default::default(),
                        )
                        .owns(
                            Api::<k8s_openapi::api::core::v1::ConfigMap>::namespaced(
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
                metrics: crate::util::metrics::ControllerMetrics::new("cephmoncluster"),
            }
        }
        #[cfg(not(feature = "metrics"))]
        {
            Self { client }
        }
    }
}

async fn reconcile(instance: Arc<CephMonCluster>, context: Arc<ContextData>) -> Result<Action, Error> {
    let client = context.client.clone();
    let namespace = instance
        .namespace()
        .ok_or_else(|| Error::UserInput("CephMonCluster must be namespaced".to_string()))?;
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

    let cluster_api: Api<CephCluster> = Api::namespaced(client.clone(), &namespace);
    let Some(cluster) = cluster_api.get_opt(&instance.spec.cluster_name).await? else {
        return Ok(Action::requeue(crate::util::PROBE_INTERVAL));
    };

    let admin_secrets: Vec<k8s_openapi::api::core::v1::Secret> =
        lists::list_by_cluster_and_entity(client.clone(), &namespace, &instance.spec.cluster_name, "client.admin")
            .await?;
    if admin_secrets.len() > 1 {
        return Err(Error::ProtocolViolation(format!(
            "{} client.admin keyrings found for cluster {}",
            admin_secrets.len(),
            instance.spec.cluster_name
        )));
    }

    let keyrings_exist =
        actions::keyrings_exist(client.clone(), &namespace, &instance.spec.cluster_name).await?;

    let monmap_config_map_name = resources::monmap_configmap_name(&name);
    let monmap_configmap: Api<k8s_openapi::api::core::v1::ConfigMap> = Api::namespaced(client.clone(), &namespace);
    let monmap_exists = monmap_configmap.get_opt(&monmap_config_map_name).await?.is_some();

    let mons: Vec<CephMon> = lists::list_by_cluster(client.clone(), &namespace, &instance.spec.cluster_name).await?;
    let full = actions::build_monmap(&mons);

    let mon_enabled = daemon_type_enabled(cluster.status.as_ref().map(|s| s.state).unwrap_or_default(), true, false);
    let obs = MonClusterObservations {
        mon_enabled,
        keyrings_exist,
        monmap_exists,
    };

    let current = instance.status.as_ref().map(|s| s.state).unwrap_or_default();
    let start_epoch = instance.status.as_ref().map(|s| s.start_epoch).unwrap_or(0);
    let next = next_state(current, start_epoch, &full, &obs);
    let new_epoch = if increments_epoch(current, next) { start_epoch + 1 } else { start_epoch };

    match current {
        MonClusterState::GenKeyrings => {
            actions::gen_keyrings(client.clone(), &namespace, &instance, &instance.spec.cluster_name).await?;
        }
        MonClusterState::GenMonMap => {
            let initial = monmap::initial_submap(&full);
            let configmap = resources::monmap_configmap(&instance, &initial);
            patch::apply(client.clone(), &namespace, &monmap_config_map_name, &configmap).await?;
        }
        MonClusterState::EnableFirstMon => {
            if let Some(seed_id) = monmap::elect_initial_member(&full) {
                if let Some(mon) = mons.iter().find(|m| m.spec.id == seed_id) {
                    patch::patch_status::<ceph_types::CephMonStatus, CephMon>(client.clone(), mon, |status| {
                        status.initial_member = true;
                    })
                    .await?;
                }
            }
        }
        _ => {}
    }

    if next != current || new_epoch != start_epoch {
        patch::patch_status::<CephMonClusterStatus, CephMonCluster>(client.clone(), &instance, |status| {
            status.state = next;
            status.start_epoch = new_epoch;
        })
        .await?;
    }

    let requeue = if next == MonClusterState::InQuorum { HEALTH_INTERVAL } else { WAIT_INTERVAL };
    Ok(Action::requeue(requeue))
}

async fn ensure_labels(client: Client, namespace: &str, mon_cluster: &CephMonCluster) -> Result<bool, Error> {
    let mut desired: BTreeMap<String, String> = BTreeMap::new();
    desired.insert(
        ceph_types::labels::CLUSTER_NAME.to_string(),
        mon_cluster.spec.cluster_name.clone(),
    );

    let current = mon_cluster.labels();
    if desired.iter().all(|(k, v)| current.get(k) == Some(v)) {
        return Ok(false);
    }

    let api: Api<CephMonCluster> = Api::namespaced(client, namespace);
    let patch = serde_json::json!({ "metadata": { "labels": desired } });
    api.patch(
        &mon_cluster.name_any(),
        &PatchParams::apply("ceph-operator"),
        &Patch::Merge(&patch),
    )
    .await?;
    Ok(true)
}

fn on_error(instance: Arc<CephMonCluster>, error: &Error, _context: Arc<ContextData>) -> Action {
    eprintln!(
        "{}",
        format!("CephMonCluster reconcile error: {:?} {:?}", error, instance.name_any()).red()
    );
    Action::requeue(Duration::from_secs(5))
}
