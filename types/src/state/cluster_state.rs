use crate::crd::ClusterState;

/// Observed readiness of a Cluster's children, gathered by the reconciler
/// before calling `next_state`. Kept separate from the transition function so
/// the state machine itself stays a pure, easily-tested mapping.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClusterObservations {
    pub disabled: bool,
    pub mon_cluster_in_quorum: bool,
    pub mon_cluster_idle: bool,
    pub daemon_clusters_running: bool,
    pub daemon_clusters_idle: bool,
    pub osds_running: bool,
    pub osds_idle: bool,
}

/// Mirrors `cephClusterStateMachine.go`'s `GetTransition`: a forward path
/// gated on downstream readiness, a reverse path gated on downstream
/// idleness, and an immediate jump to `Shutdown` from any non-terminal state
/// whenever the cluster is disabled.
pub fn next_state(current: ClusterState, obs: &ClusterObservations) -> ClusterState {
    if obs.disabled && current != ClusterState::Idle {
        if !matches!(
            current,
            ClusterState::Shutdown
                | ClusterState::StopDaemons
                | ClusterState::StopOsds
                | ClusterState::StopMons
        ) {
            return ClusterState::Shutdown;
        }
    }

    match current {
        ClusterState::Idle => {
            if !obs.disabled {
                ClusterState::StartMons
            } else {
                ClusterState::Idle
            }
        }
        ClusterState::StartMons => {
            if obs.mon_cluster_in_quorum {
                ClusterState::StartDaemons
            } else {
                ClusterState::StartMons
            }
        }
        ClusterState::StartDaemons => {
            if obs.daemon_clusters_running {
                ClusterState::StartOsds
            } else {
                ClusterState::StartDaemons
            }
        }
        ClusterState::StartOsds => {
            if obs.osds_running {
                ClusterState::Running
            } else {
                ClusterState::StartOsds
            }
        }
        ClusterState::Running => ClusterState::Running,
        ClusterState::Shutdown => ClusterState::StopDaemons,
        ClusterState::StopDaemons => {
            if obs.daemon_clusters_idle {
                ClusterState::StopOsds
            } else {
                ClusterState::StopDaemons
            }
        }
        ClusterState::StopOsds => {
            if obs.osds_idle {
                ClusterState::StopMons
            } else {
                ClusterState::StopOsds
            }
        }
        ClusterState::StopMons => {
            if obs.mon_cluster_idle {
                ClusterState::Idle
            } else {
                ClusterState::StopMons
            }
        }
    }
}

/// `clusterEnabled(daemon-type)`: the set of Cluster states in which each
/// daemon-type is allowed to run, per spec.md 4.1's enablement table.
pub fn daemon_type_enabled(state: ClusterState, is_mon: bool, is_osd: bool) -> bool {
    use ClusterState::*;
    if is_mon {
        matches!(
            state,
            StartMons | StartDaemons | StartOsds | Running | Shutdown | StopDaemons | StopOsds
        )
    } else if is_osd {
        matches!(state, StartOsds | Running | Shutdown | StopDaemons)
    } else {
        matches!(state, StartDaemons | StartOsds | Running | Shutdown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_to_start_mons_when_enabled() {
        let obs = ClusterObservations::default();
        assert_eq!(next_state(ClusterState::Idle, &obs), ClusterState::StartMons);
    }

    #[test]
    fn disabled_forces_shutdown_from_any_running_state() {
        let obs = ClusterObservations {
            disabled: true,
            ..Default::default()
        };
        assert_eq!(next_state(ClusterState::Running, &obs), ClusterState::Shutdown);
        assert_eq!(next_state(ClusterState::StartMons, &obs), ClusterState::Shutdown);
    }

    #[test]
    fn shutdown_sequence_gates_on_idleness_in_order() {
        let mut obs = ClusterObservations {
            disabled: true,
            ..Default::default()
        };
        assert_eq!(next_state(ClusterState::Shutdown, &obs), ClusterState::StopDaemons);
        assert_eq!(next_state(ClusterState::StopDaemons, &obs), ClusterState::StopDaemons);
        obs.daemon_clusters_idle = true;
        assert_eq!(next_state(ClusterState::StopDaemons, &obs), ClusterState::StopOsds);
        assert_eq!(next_state(ClusterState::StopOsds, &obs), ClusterState::StopOsds);
        obs.osds_idle = true;
        assert_eq!(next_state(ClusterState::StopOsds, &obs), ClusterState::StopMons);
        assert_eq!(next_state(ClusterState::StopMons, &obs), ClusterState::StopMons);
        obs.mon_cluster_idle = true;
        assert_eq!(next_state(ClusterState::StopMons, &obs), ClusterState::Idle);
    }

    #[test]
    fn each_daemon_type_disables_before_its_own_drain_phase() {
        // mon drains at StopMons, so it must stop being enabled there.
        assert!(daemon_type_enabled(ClusterState::StopDaemons, true, false));
        assert!(!daemon_type_enabled(ClusterState::StopMons, true, false));

        // workers (mgr/mds/rgw) drain at StopDaemons, so it must stop being
        // enabled there -- otherwise DaemonClusters never idle and the
        // Cluster deadlocks in StopDaemons.
        assert!(daemon_type_enabled(ClusterState::Shutdown, false, false));
        assert!(!daemon_type_enabled(ClusterState::StopDaemons, false, false));

        // osd drains at StopOsds, so it must stop being enabled there --
        // otherwise OSD pods never stop and the Cluster deadlocks in
        // StopOsds.
        assert!(daemon_type_enabled(ClusterState::StopDaemons, false, true));
        assert!(!daemon_type_enabled(ClusterState::StopOsds, false, true));
    }
}
