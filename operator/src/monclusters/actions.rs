use std::collections::BTreeMap;

use ceph_types::{
    CephMon, CephMonCluster,
    keyring::{self, Keyring},
    labels,
    monmap::{MonMap, MonMapEntry},
};
use k8s_openapi::ByteString;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::{Api, Client, ResourceExt};

use crate::util::owner::set_owner;

/// Builds the monmap reconstructed from every live Mon labelled for this
/// cluster, per spec.md 4.2: "the Mon list is the source of truth".
pub fn build_monmap(mons: &[CephMon]) -> MonMap {
    mons.iter()
        .map(|mon| {
            let status = mon.status.clone().unwrap_or_default();
            (
                mon.spec.id.clone(),
                MonMapEntry {
                    id: mon.spec.id.clone(),
                    pod_ip: status.pod_ip,
                    port: mon.spec.port,
                    state: status.state,
                    start_epoch: status.start_epoch,
                    initial_member: status.initial_member,
                },
            )
        })
        .collect()
}

fn keyring_secret(mon_cluster: &CephMonCluster, cluster_name: &str, kr: &Keyring) -> Secret {
    let name = kr.secret_name(cluster_name);
    let mut secret_labels = BTreeMap::new();
    secret_labels.insert(labels::CLUSTER_NAME.to_string(), cluster_name.to_string());
    secret_labels.insert(
        labels::KEYRING_ENTITY.to_string(),
        kr.entity.trim_matches('.').to_string(),
    );

    let mut meta = ObjectMeta {
        name: Some(name),
        namespace: mon_cluster.namespace(),
        labels: Some(secret_labels),
        ..Default::default()
    };
    set_owner(&mut meta, mon_cluster);

    let mut data = BTreeMap::new();
    data.insert("keyring".to_string(), ByteString(kr.render().into_bytes()));

    Secret {
        metadata: meta,
        data: Some(data),
        ..Default::default()
    }
}

/// The two keyring entities a quorum cannot start without, per spec.md 4.2's
/// `GenKeyrings` state.
fn required_keyrings() -> [Keyring; 2] {
    [Keyring::mon(keyring::generate_key()), Keyring::client_admin(keyring::generate_key())]
}

/// The bootstrap entities worker daemons authenticate with before they mint
/// their own keys, grounded on [`Keyring::bootstrap`] and consumed by the
/// Daemon reconciler (spec.md 4.5).
fn bootstrap_daemon_types() -> [&'static str; 3] {
    ["mgr", "mds", "rgw"]
}

/// Whether both required keyring Secrets already exist, and (as a side
/// effect of checking) whether more than one `client.admin` Secret is
/// present — a protocol violation per spec.md 7.
pub async fn keyrings_exist(client: Client, namespace: &str, cluster_name: &str) -> Result<bool, crate::util::Error> {
    let api: Api<Secret> = Api::namespaced(client.clone(), namespace);
    let admin_name = keyring::secret_name_for(cluster_name, "client.admin");
    let mon_name = keyring::secret_name_for(cluster_name, "mon");
    let admin = api.get_opt(&admin_name).await?;
    let mon = api.get_opt(&mon_name).await?;
    Ok(admin.is_some() && mon.is_some())
}

/// Creates any missing keyring Secret (mon, client.admin, and the
/// per-worker-type bootstrap entities), idempotently.
pub async fn gen_keyrings(
    client: Client,
    namespace: &str,
    mon_cluster: &CephMonCluster,
    cluster_name: &str,
) -> Result<(), crate::util::Error> {
    let api: Api<Secret> = Api::namespaced(client.clone(), namespace);

    for kr in required_keyrings() {
        create_if_absent(&api, mon_cluster, cluster_name, &kr).await?;
    }
    for daemon_type in bootstrap_daemon_types() {
        let kr = Keyring::bootstrap(daemon_type, keyring::generate_key());
        create_if_absent(&api, mon_cluster, cluster_name, &kr).await?;
    }
    Ok(())
}

async fn create_if_absent(
    api: &Api<Secret>,
    mon_cluster: &CephMonCluster,
    cluster_name: &str,
    kr: &Keyring,
) -> Result<(), crate::util::Error> {
    let name = kr.secret_name(cluster_name);
    if api.get_opt(&name).await?.is_some() {
        return Ok(());
    }
    let secret = keyring_secret(mon_cluster, cluster_name, kr);
    api.create(&Default::default(), &secret)
        .await
        .or_else(|e| match e {
            kube::Error::Api(ref ae) if ae.code == 409 => Ok(secret.clone()),
            other => Err(other),
        })?;
    Ok(())
}
