use super::MANAGER_NAME;
use ceph_types::*;
use k8s_openapi::{apimachinery::pkg::apis::meta::v1::Time, jiff::Timestamp};
use kube::{
    Api, Client, Error,
    api::{Patch, PatchParams, Resource},
    core::NamespaceResourceScope,
};
use serde::{Serialize, de::DeserializeOwned};
use std::{clone::Clone, fmt::Debug};

pub trait Object<S: Status> {
    /// Returns a mutable reference to the status object, initializing
    /// it with the default value if it does not exist.
    fn mut_status(&mut self) -> &mut S;
}

pub trait Status {
    /// Sets the last updated timestamp to the given value.
    fn set_last_updated(&mut self, last_updated: Time);
}

macro_rules! impl_object_status {
    ($kind:ty, $status:ty) => {
        impl Object<$status> for $kind {
            fn mut_status(&mut self) -> &mut $status {
                if self.status.is_some() {
                    return self.status.as_mut().unwrap();
                }
                self.status = Some(Default::default());
                self.status.as_mut().unwrap()
            }
        }

        impl Status for $status {
            fn set_last_updated(&mut self, last_updated: Time) {
                self.last_updated = Some(last_updated);
            }
        }
    };
}

impl_object_status!(CephCluster, CephClusterStatus);
impl_object_status!(CephMonCluster, CephMonClusterStatus);
impl_object_status!(CephDaemonCluster, CephDaemonClusterStatus);
impl_object_status!(CephMon, CephMonStatus);
impl_object_status!(CephDaemon, CephDaemonStatus);

/// Patch the resource's status object with the provided function.
/// The function is passed a mutable reference to the status object,
/// which is to be mutated in-place. Move closures are supported.
pub async fn patch_status<S: Status, T>(
    client: Client,
    instance: &T,
    f: impl FnOnce(&mut S),
) -> Result<T, Error>
where
    <T as Resource>::DynamicType: Default,
    T: Clone
        + Resource
        + Object<S>
        + Serialize
        + DeserializeOwned
        + Debug
        + Resource<Scope = NamespaceResourceScope>,
{
    let patch = Patch::Json::<T>({
        let mut modified = instance.clone();
        let status = modified.mut_status();
        f(status);
        status.set_last_updated(Time::from(Timestamp::now()));
        json_patch::diff(
            &serde_json::to_value(instance).unwrap(),
            &serde_json::to_value(&modified).unwrap(),
        )
    });
    let name = instance.meta().name.as_deref().unwrap();
    let namespace = instance.meta().namespace.as_deref().unwrap();
    let api: Api<T> = Api::namespaced(client, namespace);
    api.patch_status(name, &PatchParams::apply(MANAGER_NAME), &patch)
        .await
}

/// Server-side applies a resource, creating it if absent and refreshing it
/// otherwise. Used for the "create or refresh" derived objects spec.md 4.1
/// calls for (the ceph.conf ConfigMap, the monitor Services, the monmap
/// ConfigMap) as opposed to the create-once-then-leave-alone Pods/PVCs.
pub async fn apply<T>(client: Client, namespace: &str, name: &str, obj: &T) -> Result<T, Error>
where
    T: Clone + Resource<Scope = NamespaceResourceScope> + Serialize + DeserializeOwned + Debug,
    <T as Resource>::DynamicType: Default,
{
    let api: Api<T> = Api::namespaced(client, namespace);
    api.patch(name, &PatchParams::apply(MANAGER_NAME).force(), &Patch::Apply(obj))
        .await
}
