use rand::Rng;
use rand::seq::IndexedRandom;

/// Consonant-and-digit alphabet matching Go's `k8s.io/apimachinery/pkg/util/rand.String`:
/// avoids vowels so generated ids don't accidentally spell words.
const ALPHANUM: &[u8] = b"bcdfghjklmnpqrstvwxyz0123456789";
const LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyz";

/// A lowercase letter followed by `len - 1` random alphanumerics, matching
/// spec.md's Mon id shape (`a12345`) and the original's `rand.String(6)` used
/// for `CephDaemon.Spec.ID`.
pub fn random_id(len: usize) -> String {
    let mut rng = rand::rng();
    let mut out = String::with_capacity(len);
    out.push(*LETTERS.choose(&mut rng).unwrap() as char);
    for _ in 1..len {
        out.push(*ALPHANUM.choose(&mut rng).unwrap() as char);
    }
    out
}

/// Picks a uniformly random index in `0..len`, used by the DaemonCluster
/// scheduler's scale-down (spec.md 4.4: "determinism not a goal").
pub fn random_index(len: usize) -> usize {
    rand::rng().random_range(0..len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_id_starts_with_lowercase_letter() {
        for _ in 0..20 {
            let id = random_id(6);
            assert_eq!(id.len(), 6);
            assert!(id.chars().next().unwrap().is_ascii_lowercase());
        }
    }

    #[test]
    fn random_index_is_in_bounds() {
        for _ in 0..50 {
            assert!(random_index(5) < 5);
        }
    }
}
