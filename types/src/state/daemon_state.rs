use crate::crd::{DaemonClusterState, DaemonState};

#[derive(Debug, Clone, Copy, Default)]
pub struct DaemonObservations {
    pub disabled: bool,
    pub daemon_cluster_state: Option<DaemonClusterState>,
    pub pod_exists: bool,
    pub pod_running: bool,
    pub pod_ready: bool,
}

/// Mirrors `daemonStateMachine.go`'s `GetTransition`. `MgrStateMachine` and
/// `MdsStateMachine` delegate to this same table with no divergence, so a
/// single tagged-`DaemonType` transition function covers every worker.
pub fn next_state(current: DaemonState, obs: &DaemonObservations) -> DaemonState {
    let enabled = !obs.disabled
        && !matches!(obs.daemon_cluster_state, Some(DaemonClusterState::Idle) | None);

    if !enabled && !matches!(current, DaemonState::Cleanup | DaemonState::Idle) {
        return DaemonState::Cleanup;
    }

    match current {
        DaemonState::Idle => {
            if enabled {
                DaemonState::Launching
            } else {
                DaemonState::Idle
            }
        }
        DaemonState::Launching => DaemonState::WaitForRun,
        DaemonState::WaitForRun => {
            if obs.pod_running {
                DaemonState::WaitForReady
            } else {
                DaemonState::WaitForRun
            }
        }
        DaemonState::WaitForReady => {
            if obs.pod_ready {
                DaemonState::Ready
            } else {
                DaemonState::WaitForReady
            }
        }
        DaemonState::Ready => {
            if !obs.pod_exists {
                DaemonState::Error
            } else {
                DaemonState::Ready
            }
        }
        DaemonState::Error => DaemonState::Cleanup,
        DaemonState::Cleanup => DaemonState::Idle,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_launches_when_enabled() {
        let obs = DaemonObservations {
            daemon_cluster_state: Some(DaemonClusterState::Running),
            ..Default::default()
        };
        assert_eq!(next_state(DaemonState::Idle, &obs), DaemonState::Launching);
    }

    #[test]
    fn disabled_forces_cleanup_from_ready() {
        let obs = DaemonObservations {
            disabled: true,
            daemon_cluster_state: Some(DaemonClusterState::Running),
            pod_exists: true,
            ..Default::default()
        };
        assert_eq!(next_state(DaemonState::Ready, &obs), DaemonState::Cleanup);
    }

    #[test]
    fn ready_errors_when_pod_disappears() {
        let obs = DaemonObservations {
            daemon_cluster_state: Some(DaemonClusterState::Running),
            pod_exists: false,
            ..Default::default()
        };
        assert_eq!(next_state(DaemonState::Ready, &obs), DaemonState::Error);
    }

    #[test]
    fn idle_parent_daemon_cluster_disables() {
        let obs = DaemonObservations {
            daemon_cluster_state: Some(DaemonClusterState::Idle),
            ..Default::default()
        };
        assert_eq!(next_state(DaemonState::Idle, &obs), DaemonState::Idle);
    }
}
