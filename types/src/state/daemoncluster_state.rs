use crate::crd::DaemonClusterState;

#[derive(Debug, Clone, Copy, Default)]
pub struct DaemonClusterObservations {
    pub enabled: bool,
    pub current_count: u32,
    pub desired_count: u32,
    pub list_failed: bool,
}

/// Mirrors `daemonClusterStateMachine.go`'s `GetTransition`: a single
/// create-or-delete happens per reconcile while in `Scaling`, driven by the
/// caller comparing `current_count` to `desired_count` from the previous
/// action.
pub fn next_state(current: DaemonClusterState, obs: &DaemonClusterObservations) -> DaemonClusterState {
    if !obs.enabled {
        return DaemonClusterState::Idle;
    }

    if obs.list_failed {
        return DaemonClusterState::Error;
    }

    match current {
        DaemonClusterState::Idle => DaemonClusterState::Running,
        DaemonClusterState::Error => DaemonClusterState::Running,
        DaemonClusterState::Running => {
            if obs.current_count != obs.desired_count {
                DaemonClusterState::Scaling
            } else {
                DaemonClusterState::Running
            }
        }
        DaemonClusterState::Scaling => {
            if obs.current_count == obs.desired_count {
                DaemonClusterState::Running
            } else {
                DaemonClusterState::Scaling
            }
        }
    }
}

/// Whether the scheduler should create (true) or delete (false) a Daemon this
/// reconcile, given the gap between observed and desired replica counts.
pub fn scale_direction(obs: &DaemonClusterObservations) -> Option<bool> {
    if obs.current_count < obs.desired_count {
        Some(true)
    } else if obs.current_count > obs.desired_count {
        Some(false)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_forces_idle_from_any_state() {
        let obs = DaemonClusterObservations::default();
        assert_eq!(next_state(DaemonClusterState::Running, &obs), DaemonClusterState::Idle);
        assert_eq!(next_state(DaemonClusterState::Scaling, &obs), DaemonClusterState::Idle);
    }

    #[test]
    fn running_moves_to_scaling_on_mismatch() {
        let obs = DaemonClusterObservations {
            enabled: true,
            current_count: 1,
            desired_count: 3,
            list_failed: false,
        };
        assert_eq!(next_state(DaemonClusterState::Running, &obs), DaemonClusterState::Scaling);
        assert_eq!(scale_direction(&obs), Some(true));
    }

    #[test]
    fn scaling_returns_to_running_when_balanced() {
        let obs = DaemonClusterObservations {
            enabled: true,
            current_count: 3,
            desired_count: 3,
            list_failed: false,
        };
        assert_eq!(next_state(DaemonClusterState::Scaling, &obs), DaemonClusterState::Running);
        assert_eq!(scale_direction(&obs), None);
    }

    #[test]
    fn scale_down_direction_when_over_desired() {
        let obs = DaemonClusterObservations {
            enabled: true,
            current_count: 5,
            desired_count: 3,
            list_failed: false,
        };
        assert_eq!(scale_direction(&obs), Some(false));
    }
}
