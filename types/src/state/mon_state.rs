use crate::crd::MonClusterState;
use crate::monmap::MonState;

#[derive(Debug, Clone, Copy, Default)]
pub struct MonObservations {
    pub disabled: bool,
    pub mon_cluster_state: Option<MonClusterState>,
    pub initial_member: bool,
    pub pod_exists: bool,
    pub pod_running: bool,
    pub pod_ready: bool,
}

/// Mirrors `monStateMachine.go`'s `GetTransition`.
pub fn next_state(current: MonState, obs: &MonObservations) -> MonState {
    let moncluster_lost_or_idle = matches!(
        obs.mon_cluster_state,
        Some(MonClusterState::LostQuorum) | Some(MonClusterState::Idle) | None
    );

    if (obs.disabled || moncluster_lost_or_idle)
        && !matches!(current, MonState::Cleanup | MonState::Idle)
    {
        return MonState::Cleanup;
    }

    match current {
        MonState::Idle => {
            let moncluster_in_quorum = obs.mon_cluster_state == Some(MonClusterState::InQuorum);
            let moncluster_launching_as_initial = obs.mon_cluster_state
                == Some(MonClusterState::Launching)
                && obs.initial_member;
            if moncluster_in_quorum || moncluster_launching_as_initial {
                MonState::LaunchPod
            } else {
                MonState::Idle
            }
        }
        MonState::LaunchPod => {
            let ready_to_launch = matches!(
                obs.mon_cluster_state,
                Some(MonClusterState::InQuorum)
                    | Some(MonClusterState::EstablishingQuorum)
                    | Some(MonClusterState::Launching)
            );
            if !ready_to_launch {
                MonState::LaunchPod
            } else if obs.mon_cluster_state == Some(MonClusterState::InQuorum) {
                MonState::WaitForPodReady
            } else {
                MonState::WaitForPodRun
            }
        }
        MonState::WaitForPodRun => {
            if obs.pod_running {
                MonState::WaitForPodReady
            } else {
                MonState::WaitForPodRun
            }
        }
        MonState::WaitForPodReady => {
            if obs.pod_ready {
                MonState::InQuorum
            } else {
                MonState::WaitForPodReady
            }
        }
        MonState::InQuorum => {
            if !obs.pod_exists {
                MonState::Error
            } else if obs.pod_ready {
                MonState::InQuorum
            } else {
                MonState::Cleanup
            }
        }
        MonState::Error => MonState::Cleanup,
        MonState::Cleanup => MonState::Idle,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_forces_cleanup() {
        let obs = MonObservations {
            disabled: true,
            ..Default::default()
        };
        assert_eq!(next_state(MonState::InQuorum, &obs), MonState::Cleanup);
    }

    #[test]
    fn idle_launches_for_initial_member_during_launching() {
        let obs = MonObservations {
            mon_cluster_state: Some(MonClusterState::Launching),
            initial_member: true,
            ..Default::default()
        };
        assert_eq!(next_state(MonState::Idle, &obs), MonState::LaunchPod);
    }

    #[test]
    fn idle_stays_for_non_initial_member_during_launching() {
        let obs = MonObservations {
            mon_cluster_state: Some(MonClusterState::Launching),
            initial_member: false,
            ..Default::default()
        };
        assert_eq!(next_state(MonState::Idle, &obs), MonState::Idle);
    }

    #[test]
    fn in_quorum_demotes_without_error_when_not_ready() {
        let obs = MonObservations {
            mon_cluster_state: Some(MonClusterState::InQuorum),
            pod_exists: true,
            pod_ready: false,
            ..Default::default()
        };
        assert_eq!(next_state(MonState::InQuorum, &obs), MonState::Cleanup);
    }

    #[test]
    fn in_quorum_errors_when_pod_missing() {
        let obs = MonObservations {
            mon_cluster_state: Some(MonClusterState::InQuorum),
            pod_exists: false,
            ..Default::default()
        };
        assert_eq!(next_state(MonState::InQuorum, &obs), MonState::Error);
    }
}
