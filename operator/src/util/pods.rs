use k8s_openapi::api::core::v1::Pod;
use kube::{Api, Client};

use super::Error;

/// Fetches a Pod by name, treating not-found as `Ok(None)` rather than an
/// error: on get paths a missing resource usually just means it hasn't been
/// created yet.
pub async fn get_pod(client: Client, namespace: &str, name: &str) -> Result<Option<Pod>, Error> {
    let api: Api<Pod> = Api::namespaced(client, namespace);
    match api.get_opt(name).await? {
        Some(pod) => Ok(Some(pod)),
        None => Ok(None),
    }
}

pub fn pod_running(pod: &Pod) -> bool {
    pod.status
        .as_ref()
        .and_then(|s| s.phase.as_deref())
        .map(|phase| phase == "Running")
        .unwrap_or(false)
}

pub fn pod_ready(pod: &Pod) -> bool {
    pod.status
        .as_ref()
        .and_then(|s| s.conditions.as_ref())
        .map(|conds| {
            conds
                .iter()
                .any(|c| c.type_ == "Ready" && c.status == "True")
        })
        .unwrap_or(false)
}

pub fn pod_ip(pod: &Pod) -> Option<String> {
    pod.status.as_ref().and_then(|s| s.pod_ip.clone())
}
