use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq, JsonSchema)]
pub enum MonState {
    Idle,
    LaunchPod,
    WaitForPodRun,
    WaitForPodReady,
    InQuorum,
    Error,
    Cleanup,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct MonMapEntry {
    pub id: String,
    pub pod_ip: Option<String>,
    pub port: u16,
    pub state: MonState,
    pub start_epoch: u64,
    pub initial_member: bool,
}

/// Monitor map keyed by Mon id, reconstructed fresh from live CephMon objects
/// on every reconcile rather than persisted as an authoritative resource.
pub type MonMap = BTreeMap<String, MonMapEntry>;

/// `floor(n/2) + 1`, per spec.md's quorum formula.
pub fn quorum_count(n: usize) -> usize {
    n / 2 + 1
}

/// The submap of entries marked `initial_member = true`. Most quorum
/// calculations operate on this submap, not the full monmap.
pub fn initial_submap(map: &MonMap) -> MonMap {
    map.iter()
        .filter(|(_, e)| e.initial_member)
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

pub fn count_in_state(map: &MonMap, state: MonState) -> usize {
    map.values().filter(|e| e.state == state).count()
}

pub fn all_in_state(map: &MonMap, state: MonState) -> bool {
    map.values().all(|e| e.state == state)
}

/// Count of entries that are `InQuorum` at exactly the given epoch, compared
/// against the submap's own quorum count.
pub fn quorum_at_epoch(map: &MonMap, epoch: u64) -> bool {
    let in_quorum = map
        .values()
        .filter(|e| e.state == MonState::InQuorum && e.start_epoch == epoch)
        .count();
    in_quorum >= quorum_count(map.len())
}

pub fn count_initial_members(map: &MonMap) -> usize {
    map.values().filter(|e| e.initial_member).count()
}

/// Deterministic initial-member election: the lexicographically smallest Mon
/// id in the full monmap. The original scaffold used unspecified Go map
/// iteration order ("GetRandomEntry"); a reconciler must be deterministic.
pub fn elect_initial_member(map: &MonMap) -> Option<String> {
    map.keys().next().cloned()
}

pub fn empty() -> MonMap {
    MonMap::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quorum_count_matches_spec_table() {
        assert_eq!(quorum_count(1), 1);
        assert_eq!(quorum_count(2), 2);
        assert_eq!(quorum_count(3), 2);
        assert_eq!(quorum_count(4), 3);
        assert_eq!(quorum_count(5), 3);
    }

    #[test]
    fn elects_lexicographically_smallest_id() {
        let mut map = MonMap::new();
        for id in ["mon-c", "mon-a", "mon-b"] {
            map.insert(
                id.to_string(),
                MonMapEntry {
                    id: id.to_string(),
                    pod_ip: None,
                    port: 6789,
                    state: MonState::Idle,
                    start_epoch: 0,
                    initial_member: false,
                },
            );
        }
        assert_eq!(elect_initial_member(&map).as_deref(), Some("mon-a"));
    }

    #[test]
    fn quorum_at_epoch_requires_matching_epoch() {
        let mut map = MonMap::new();
        for (id, state, epoch) in [
            ("a", MonState::InQuorum, 7u64),
            ("b", MonState::InQuorum, 7u64),
            ("c", MonState::InQuorum, 6u64),
        ] {
            map.insert(
                id.to_string(),
                MonMapEntry {
                    id: id.to_string(),
                    pod_ip: None,
                    port: 6789,
                    state,
                    start_epoch: epoch,
                    initial_member: true,
                },
            );
        }
        assert!(quorum_at_epoch(&map, 7));
        assert!(!quorum_at_epoch(&map, 6));
    }
}
