use ceph_types::{
    CephCluster, CephMon, CephMonCluster, CephMonStatus,
    monmap::MonState,
    state::mon_state::{MonObservations, next_state},
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
use crate::util::{Error, PROBE_INTERVAL, WAIT_INTERVAL, lists, patch, pods, selector::parse_selector, resources};

pub async fn run(client: Client) -> Result<(), Error> {
    println!("{}", "⚙️ Starting Mon controller...".green());

    let context: Arc<ContextData> = Arc::new(ContextData::new(client.clone()));

    let lease_namespace = std::env::var("NAMESPACE").unwrap_or_else(|_| "default".to_string());
    let holder_id = std::env::var("POD_NAME")
        .or_else(|_| std::env::var("HOSTNAME"))
        .unwrap_or_else(|_| format!("ceph-mon-controller-{}", uuid::Uuid::new_v4()));
    let leadership = LeaseLock::new(
        client.clone(),
        &lease_namespace,
        LeaseLockParams {
            holder_id,
            lease_name: "ceph-mon-controller-lock".to_string(),
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
                println!("{}", "👑 Acquired leadership; starting Mon controller".green());
                let client_for_controller = client.clone();
                let context_for_controller = context.clone();
                let controller_namespace = lease_namespace.clone();
                let crd_api: Api<CephMon> =
                    Api::namespaced(client_for_controller.clone(), &controller_namespace);
                controller_task = Some(tokio::spawn(async move {
                    // Event mapper, spec.md 4.8: pod phase/readiness changes
                    // drive WaitForPodRun/WaitForPodReady/InQuorum directly
                    // rather than waiting out WAIT_INTERVAL.
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
                metrics: crate::util::metrics::ControllerMetrics::new("cephmon"),
            }
        }
        #[cfg(not(feature = "metrics"))]
        {
            Self { client }
        }
    }
}

async fn reconcile(instance: Arc<CephMon>, context: Arc<ContextData>) -> Result<Action, Error> {
    let client = context.client.clone();
    let namespace = instance
        .namespace()
        .ok_or_else(|| Error::UserInput("CephMon must be namespaced".to_string()))?;
    let name = instance.name_any();

    #[cfg(feature = "metrics")]
    context
        .metrics
        .reconcile_counter
        .with_label_values(&[&name, &namespace])
        .inc();

    let cluster_api: Api<CephCluster> = Api::namespaced(client.clone(), &namespace);
    let Some(cluster) = cluster_api.get_opt(&instance.spec.cluster_name).await? else {
        return Ok(Action::requeue(PROBE_INTERVAL));
    };

    if ensure_labels(client.clone(), &namespace, &instance, &cluster.spec.mon_service_name).await? {
        return Ok(Action::requeue(WAIT_INTERVAL));
    }

    let mon_clusters: Vec<CephMonCluster> =
        lists::list_by_cluster(client.clone(), &namespace, &instance.spec.cluster_name).await?;
    if mon_clusters.len() > 1 {
        return Err(Error::ProtocolViolation(format!(
            "{} MonClusters found for cluster {}",
            mon_clusters.len(),
            instance.spec.cluster_name
        )));
    }
    let mon_cluster = mon_clusters.into_iter().next();

    let pod_name = actions::pod_name(&name);
    let existing_pod = pods::get_pod(client.clone(), &namespace, &pod_name).await?;

    let current = instance.status.as_ref().map(|s| s.state).unwrap_or(MonState::Idle);
    let obs = MonObservations {
        disabled: instance.spec.disabled,
        mon_cluster_state: mon_cluster.as_ref().and_then(|mc| mc.status.as_ref()).map(|s| s.state),
        initial_member: instance.status.as_ref().map(|s| s.initial_member).unwrap_or(false),
        pod_exists: existing_pod.is_some(),
        pod_running: existing_pod.as_ref().map(pods::pod_running).unwrap_or(false),
        pod_ready: existing_pod.as_ref().map(pods::pod_ready).unwrap_or(false),
    };

    let next = next_state(current, &obs);

    if current == MonState::LaunchPod && existing_pod.is_none() {
        if let Some(mon_cluster) = mon_cluster.as_ref() {
            let pv_selector = parse_selector(&instance.spec.pv_selector)?;
            let pvc = actions::pvc_resource(&instance, &instance.spec.cluster_name, pv_selector);
            let pvc_api: Api<k8s_openapi::api::core::v1::PersistentVolumeClaim> =
                Api::namespaced(client.clone(), &namespace);
            pvc_api
                .create(&Default::default(), &pvc)
                .await
                .or_else(|e| match e {
                    kube::Error::Api(ref ae) if ae.code == 409 => Ok(pvc.clone()),
                    other => Err(other),
                })?;

            let config_map_name = resources::ceph_conf_configmap_name(&instance.spec.cluster_name);
            let monmap_config_map_name = resources::monmap_configmap_name(&mon_cluster.name_any());
            let start_epoch = mon_cluster.status.as_ref().map(|s| s.start_epoch).unwrap_or(0);
            let pod = actions::pod_resource(
                &instance,
                &instance.spec.cluster_name,
                &cluster.spec.mon_service_name,
                &mon_cluster.spec.image,
                &config_map_name,
                &monmap_config_map_name,
                start_epoch,
            );
            let pod_api: Api<k8s_openapi::api::core::v1::Pod> = Api::namespaced(client.clone(), &namespace);
            pod_api
                .create(&Default::default(), &pod)
                .await
                .or_else(|e| match e {
                    kube::Error::Api(ref ae) if ae.code == 409 => Ok(pod.clone()),
                    other => Err(other),
                })?;
        }
    }

    if current == MonState::Cleanup {
        if existing_pod.is_some() {
            let pod_api: Api<k8s_openapi::api::core::v1::Pod> = Api::namespaced(client.clone(), &namespace);
            pod_api
                .delete(&pod_name, &Default::default())
                .await
                .or_else(|e| match e {
                    kube::Error::Api(ref ae) if ae.code == 404 => Ok(Default::default()),
                    other => Err(other),
                })?;
        }
    }

    if next != current {
        let start_epoch = mon_cluster.as_ref().and_then(|mc| mc.status.as_ref()).map(|s| s.start_epoch);
        let pod_ip = existing_pod.as_ref().and_then(pods::pod_ip);
        patch::patch_status::<CephMonStatus, CephMon>(client.clone(), &instance, |status| {
            status.state = next;
            if current == MonState::WaitForPodRun && next == MonState::WaitForPodReady {
                status.pod_ip = pod_ip.clone();
                if let Some(epoch) = start_epoch {
                    status.start_epoch = epoch;
                }
            }
            if current == MonState::WaitForPodReady && next == MonState::InQuorum {
                status.initial_member = true;
            }
        })
        .await?;
        return Ok(Action::requeue(WAIT_INTERVAL));
    }

    let requeue = if next == MonState::InQuorum {
        crate::util::HEALTH_INTERVAL
    } else {
        WAIT_INTERVAL
    };
    Ok(Action::requeue(requeue))
}

/// Label maintenance: the first action of every reconciler, per spec.md 4.8.
async fn ensure_labels(
    client: Client,
    namespace: &str,
    mon: &CephMon,
    mon_service_name: &str,
) -> Result<bool, Error> {
    let mut desired: BTreeMap<String, String> = BTreeMap::new();
    desired.insert(ceph_types::labels::CLUSTER_NAME.to_string(), mon.spec.cluster_name.clone());
    desired.insert(ceph_types::labels::DAEMON_TYPE.to_string(), "mon".to_string());
    desired.insert(ceph_types::labels::MONITOR_SERVICE.to_string(), mon_service_name.to_string());

    let current = mon.labels();
    if desired.iter().all(|(k, v)| current.get(k) == Some(v)) {
        return Ok(false);
    }

    let api: Api<CephMon> = Api::namespaced(client, namespace);
    let patch = serde_json::json!({ "metadata": { "labels": desired } });
    api.patch(
        &mon.name_any(),
        &PatchParams::apply("ceph-operator"),
        &Patch::Merge(&patch),
    )
    .await?;
    Ok(true)
}

fn on_error(instance: Arc<CephMon>, error: &Error, _context: Arc<ContextData>) -> Action {
    eprintln!(
        "{}",
        format!("CephMon reconcile error: {:?} {:?}", error, instance.name_any()).red()
    );
    Action::requeue(Duration::from_secs(5))
}
