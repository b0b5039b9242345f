use crate::crd::MonClusterState;
use crate::monmap::{self, MonMap};

#[derive(Debug, Clone, Copy, Default)]
pub struct MonClusterObservations {
    pub mon_enabled: bool,
    pub keyrings_exist: bool,
    pub monmap_exists: bool,
}

/// One step of `monClusterStateMachine.go`'s `GetTransition`, operating on the
/// full monmap (reconstructed from live CephMon objects) and the derived
/// initial submap.
pub fn next_state(
    current: MonClusterState,
    start_epoch: u64,
    full: &MonMap,
    obs: &MonClusterObservations,
) -> MonClusterState {
    if !obs.mon_enabled {
        return if current == MonClusterState::Idle {
            MonClusterState::Idle
        } else {
            MonClusterState::LostQuorum
        };
    }

    let initial = monmap::initial_submap(full);

    match current {
        MonClusterState::Idle => {
            if !obs.keyrings_exist {
                MonClusterState::GenKeyrings
            } else if !obs.monmap_exists {
                MonClusterState::GenMonMap
            } else if !full.is_empty() {
                MonClusterState::Launching
            } else {
                MonClusterState::Idle
            }
        }
        MonClusterState::GenKeyrings => MonClusterState::Idle,
        MonClusterState::GenMonMap => MonClusterState::Idle,
        MonClusterState::Launching => {
            if monmap::count_initial_members(&initial) == 0 {
                MonClusterState::EnableFirstMon
            } else if monmap::quorum_at_epoch(&initial, start_epoch) {
                MonClusterState::EstablishingQuorum
            } else {
                MonClusterState::Launching
            }
        }
        MonClusterState::EnableFirstMon => MonClusterState::Launching,
        MonClusterState::EstablishingQuorum => {
            let quorum = monmap::quorum_count(initial.len());
            if monmap::count_in_state(&initial, monmap::MonState::InQuorum) >= quorum {
                MonClusterState::InQuorum
            } else if monmap::count_in_state(&initial, monmap::MonState::Idle) >= quorum {
                MonClusterState::LostQuorum
            } else {
                MonClusterState::EstablishingQuorum
            }
        }
        MonClusterState::InQuorum => {
            let quorum = monmap::quorum_count(initial.len());
            if monmap::count_in_state(&initial, monmap::MonState::InQuorum) < quorum {
                MonClusterState::LostQuorum
            } else {
                MonClusterState::InQuorum
            }
        }
        MonClusterState::LostQuorum => {
            if monmap::all_in_state(&initial, monmap::MonState::Idle) {
                MonClusterState::Idle
            } else {
                MonClusterState::LostQuorum
            }
        }
    }
}

/// Whether this reconcile's `Idle -> Launching` transition should increment
/// `startEpoch`: exactly the edge the transition table walks once per launch.
pub fn increments_epoch(from: MonClusterState, to: MonClusterState) -> bool {
    from == MonClusterState::Idle && to == MonClusterState::Launching
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monmap::{MonMapEntry, MonState};

    fn entry(id: &str, state: MonState, epoch: u64, initial: bool) -> (String, MonMapEntry) {
        (
            id.to_string(),
            MonMapEntry {
                id: id.to_string(),
                pod_ip: None,
                port: 6789,
                state,
                start_epoch: epoch,
                initial_member: initial,
            },
        )
    }

    #[test]
    fn idle_generates_keyrings_first() {
        let obs = MonClusterObservations {
            mon_enabled: true,
            keyrings_exist: false,
            monmap_exists: false,
        };
        let full = MonMap::new();
        assert_eq!(
            next_state(MonClusterState::Idle, 0, &full, &obs),
            MonClusterState::GenKeyrings
        );
    }

    #[test]
    fn idle_moves_to_launching_once_keyrings_and_monmap_and_mons_exist() {
        let obs = MonClusterObservations {
            mon_enabled: true,
            keyrings_exist: true,
            monmap_exists: true,
        };
        let full: MonMap = [entry("a", MonState::Idle, 0, false)].into_iter().collect();
        assert_eq!(
            next_state(MonClusterState::Idle, 0, &full, &obs),
            MonClusterState::Launching
        );
    }

    #[test]
    fn launching_enables_first_mon_when_no_initial_member() {
        let obs = MonClusterObservations {
            mon_enabled: true,
            keyrings_exist: true,
            monmap_exists: true,
        };
        let full: MonMap = [entry("a", MonState::Idle, 0, false)].into_iter().collect();
        assert_eq!(
            next_state(MonClusterState::Launching, 1, &full, &obs),
            MonClusterState::EnableFirstMon
        );
    }

    #[test]
    fn establishing_quorum_promotes_on_quorum_count() {
        let obs = MonClusterObservations {
            mon_enabled: true,
            keyrings_exist: true,
            monmap_exists: true,
        };
        let full: MonMap = [
            entry("a", MonState::InQuorum, 1, true),
            entry("b", MonState::InQuorum, 1, true),
            entry("c", MonState::Idle, 0, true),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            next_state(MonClusterState::EstablishingQuorum, 1, &full, &obs),
            MonClusterState::InQuorum
        );
    }

    #[test]
    fn in_quorum_demotes_to_lost_quorum_below_threshold() {
        let obs = MonClusterObservations {
            mon_enabled: true,
            keyrings_exist: true,
            monmap_exists: true,
        };
        let full: MonMap = [
            entry("a", MonState::InQuorum, 1, true),
            entry("b", MonState::Idle, 0, true),
            entry("c", MonState::Idle, 0, true),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            next_state(MonClusterState::InQuorum, 1, &full, &obs),
            MonClusterState::LostQuorum
        );
    }

    #[test]
    fn lost_quorum_returns_to_idle_once_all_initial_members_idle() {
        let obs = MonClusterObservations {
            mon_enabled: true,
            keyrings_exist: true,
            monmap_exists: true,
        };
        let full: MonMap = [
            entry("a", MonState::Idle, 0, true),
            entry("b", MonState::Idle, 0, true),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            next_state(MonClusterState::LostQuorum, 1, &full, &obs),
            MonClusterState::Idle
        );
    }
}
