use ceph_types::labels;
use kube::{
    Api, Client,
    api::{ListParams, ResourceExt},
};
use serde::de::DeserializeOwned;
use std::fmt::Debug;

/// Lists every namespaced object of kind `T` carrying the `cluster-name`
/// label set to `cluster`. Grounds the event-mapper fan-out pattern
/// described for every *-Cluster reconciler: a child list is always derived
/// by label rather than by walking parent spec.
pub async fn list_by_cluster<T>(
    client: Client,
    namespace: &str,
    cluster: &str,
) -> kube::Result<Vec<T>>
where
    T: kube::Resource<Scope = kube::core::NamespaceResourceScope>
        + Clone
        + Debug
        + DeserializeOwned
        + ResourceExt,
    T::DynamicType: Default,
{
    let api: Api<T> = Api::namespaced(client, namespace);
    let lp = ListParams::default().labels(&format!("{}={cluster}", labels::CLUSTER_NAME));
    Ok(api.list(&lp).await?.items)
}

/// Lists every object of kind `T` labelled for `(cluster, daemon_type)`, used
/// by the DaemonCluster reconciler to count its own Daemon children.
pub async fn list_by_cluster_and_type<T>(
    client: Client,
    namespace: &str,
    cluster: &str,
    daemon_type: &str,
) -> kube::Result<Vec<T>>
where
    T: kube::Resource<Scope = kube::core::NamespaceResourceScope>
        + Clone
        + Debug
        + DeserializeOwned
        + ResourceExt,
    T::DynamicType: Default,
{
    let api: Api<T> = Api::namespaced(client, namespace);
    let lp = ListParams::default().labels(&format!(
        "{}={cluster},{}={daemon_type}",
        labels::CLUSTER_NAME,
        labels::DAEMON_TYPE
    ));
    Ok(api.list(&lp).await?.items)
}

/// Lists every object of kind `T` labelled for `(cluster, keyring-entity)`,
/// used by MonCluster to find a keyring Secret while checking for the
/// "admin-keyring count != 1" protocol violation (spec.md 7).
pub async fn list_by_cluster_and_entity<T>(
    client: Client,
    namespace: &str,
    cluster: &str,
    entity: &str,
) -> kube::Result<Vec<T>>
where
    T: kube::Resource<Scope = kube::core::NamespaceResourceScope>
        + Clone
        + Debug
        + DeserializeOwned
        + ResourceExt,
    T::DynamicType: Default,
{
    let api: Api<T> = Api::namespaced(client, namespace);
    let lp = ListParams::default().labels(&format!(
        "{}={cluster},{}={entity}",
        labels::CLUSTER_NAME,
        labels::KEYRING_ENTITY
    ));
    Ok(api.list(&lp).await?.items)
}
