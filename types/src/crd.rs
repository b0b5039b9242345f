use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::cephconf::ConfigSection;
use crate::daemon_type::DaemonType;
use crate::monmap::MonState;

fn default_mon_port() -> u16 {
    6789
}

// --- CephCluster -----------------------------------------------------------

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq, JsonSchema, Default)]
pub enum ClusterState {
    #[default]
    Idle,
    StartMons,
    StartDaemons,
    StartOsds,
    Running,
    Shutdown,
    StopDaemons,
    StopOsds,
    StopMons,
}

#[derive(CustomResource, Serialize, Deserialize, Default, Debug, PartialEq, Clone, JsonSchema)]
#[kube(
    group = "ceph.pgc.dev",
    version = "v1alpha1",
    kind = "CephCluster",
    plural = "cephclusters",
    derive = "PartialEq",
    status = "CephClusterStatus",
    namespaced
)]
#[kube(derive = "Default")]
#[kube(
    printcolumn = "{\"jsonPath\": \".status.state\", \"name\": \"STATE\", \"type\": \"string\" }"
)]
pub struct CephClusterSpec {
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub config: Vec<ConfigSection>,
    pub fsid: String,
    pub mon_service_name: String,
    pub cluster_domain: String,
    pub mon_image: String,
    pub osd_image: String,
    pub mgr_image: String,
    pub mds_image: String,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Default, JsonSchema)]
pub struct CephClusterStatus {
    pub state: ClusterState,
    pub message: Option<String>,
    #[serde(rename = "lastUpdated")]
    pub last_updated: Option<Time>,
}

// --- CephMonCluster ----------------------------------------------------------

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq, JsonSchema, Default)]
pub enum MonClusterState {
    #[default]
    Idle,
    GenKeyrings,
    GenMonMap,
    Launching,
    EnableFirstMon,
    EstablishingQuorum,
    InQuorum,
    LostQuorum,
}

#[derive(CustomResource, Serialize, Deserialize, Default, Debug, PartialEq, Clone, JsonSchema)]
#[kube(
    group = "ceph.pgc.dev",
    version = "v1alpha1",
    kind = "CephMonCluster",
    plural = "cephmonclusters",
    derive = "PartialEq",
    status = "CephMonClusterStatus",
    namespaced
)]
#[kube(derive = "Default")]
#[kube(
    printcolumn = "{\"jsonPath\": \".status.state\", \"name\": \"STATE\", \"type\": \"string\" }"
)]
pub struct CephMonClusterSpec {
    pub cluster_name: String,
    pub image: String,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Default, JsonSchema)]
pub struct CephMonClusterStatus {
    pub state: MonClusterState,
    #[serde(default)]
    pub start_epoch: u64,
    #[serde(rename = "lastUpdated")]
    pub last_updated: Option<Time>,
}

// --- CephDaemonCluster -------------------------------------------------------

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq, JsonSchema, Default)]
pub enum DaemonClusterState {
    #[default]
    Idle,
    Running,
    Scaling,
    Error,
}

#[derive(CustomResource, Serialize, Deserialize, Default, Debug, PartialEq, Clone, JsonSchema)]
#[kube(
    group = "ceph.pgc.dev",
    version = "v1alpha1",
    kind = "CephDaemonCluster",
    plural = "cephdaemonclusters",
    derive = "PartialEq",
    status = "CephDaemonClusterStatus",
    namespaced
)]
#[kube(derive = "Default")]
#[kube(
    printcolumn = "{\"jsonPath\": \".status.state\", \"name\": \"STATE\", \"type\": \"string\" }"
)]
pub struct CephDaemonClusterSpec {
    pub cluster_name: String,
    pub daemon_type: DaemonType,
    pub image: String,
    pub config_map_name: String,
    #[serde(default)]
    pub disabled: bool,
    pub replicas: u32,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Default, JsonSchema)]
pub struct CephDaemonClusterStatus {
    pub state: DaemonClusterState,
    #[serde(rename = "lastUpdated")]
    pub last_updated: Option<Time>,
}

// --- CephMon -----------------------------------------------------------------

#[derive(CustomResource, Serialize, Deserialize, Default, Debug, PartialEq, Clone, JsonSchema)]
#[kube(
    group = "ceph.pgc.dev",
    version = "v1alpha1",
    kind = "CephMon",
    plural = "cephmons",
    derive = "PartialEq",
    status = "CephMonStatus",
    namespaced
)]
#[kube(derive = "Default")]
#[kube(
    printcolumn = "{\"jsonPath\": \".status.state\", \"name\": \"STATE\", \"type\": \"string\" }"
)]
pub struct CephMonSpec {
    pub cluster_name: String,
    pub id: String,
    #[serde(default = "default_mon_port")]
    pub port: u16,
    pub pv_selector: String,
    #[serde(default)]
    pub disabled: bool,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct CephMonStatus {
    pub state: MonState,
    pub pod_ip: Option<String>,
    #[serde(default)]
    pub start_epoch: u64,
    #[serde(default)]
    pub initial_member: bool,
    #[serde(rename = "lastUpdated")]
    pub last_updated: Option<Time>,
}

impl Default for CephMonStatus {
    fn default() -> Self {
        Self {
            state: MonState::Idle,
            pod_ip: None,
            start_epoch: 0,
            initial_member: false,
            last_updated: None,
        }
    }
}

// --- CephDaemon ---------------------------------------------------------------

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq, JsonSchema, Default)]
pub enum DaemonState {
    #[default]
    Idle,
    Launching,
    WaitForRun,
    WaitForReady,
    Ready,
    Error,
    Cleanup,
}

#[derive(CustomResource, Serialize, Deserialize, Default, Debug, PartialEq, Clone, JsonSchema)]
#[kube(
    group = "ceph.pgc.dev",
    version = "v1alpha1",
    kind = "CephDaemon",
    plural = "cephdaemons",
    derive = "PartialEq",
    status = "CephDaemonStatus",
    namespaced
)]
#[kube(derive = "Default")]
#[kube(
    printcolumn = "{\"jsonPath\": \".status.state\", \"name\": \"STATE\", \"type\": \"string\" }"
)]
pub struct CephDaemonSpec {
    pub cluster_name: String,
    pub id: String,
    pub image: String,
    pub daemon_type: DaemonType,
    pub config_map_name: String,
    #[serde(default)]
    pub disabled: bool,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Default, JsonSchema)]
pub struct CephDaemonStatus {
    pub state: DaemonState,
    #[serde(rename = "lastUpdated")]
    pub last_updated: Option<Time>,
}

// --- CephOsd -------------------------------------------------------------------

#[derive(CustomResource, Serialize, Deserialize, Default, Debug, PartialEq, Clone, JsonSchema)]
#[kube(
    group = "ceph.pgc.dev",
    version = "v1alpha1",
    kind = "CephOsd",
    plural = "cephosds",
    derive = "PartialEq",
    namespaced
)]
#[kube(derive = "Default")]
pub struct CephOsdSpec {
    pub cluster_name: String,
    pub id: u32,
    pub pv_selector: String,
    #[serde(default)]
    pub disabled: bool,
}
