use std::collections::BTreeMap;

use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::Utc;
use rand::RngCore;

/// Encodes a 16 byte Ceph secret key into the base64 form Ceph expects on disk:
/// a 12 byte header (type, seconds, nanoseconds, key length, all little endian)
/// followed by the raw key bytes.
pub fn encode_key(key: &[u8; 16], secs: i32, nanos: i32) -> String {
    let mut buf = Vec::with_capacity(12 + 16);
    buf.extend_from_slice(&1i16.to_le_bytes());
    buf.extend_from_slice(&secs.to_le_bytes());
    buf.extend_from_slice(&nanos.to_le_bytes());
    buf.extend_from_slice(&16i16.to_le_bytes());
    buf.extend_from_slice(key);
    STANDARD.encode(buf)
}

/// Computes a keyring Secret's name from a cluster and entity without
/// constructing a full [`Keyring`] value, for reconcilers that only need to
/// check existence (e.g. MonCluster's `keyrings_exist` observation).
pub fn secret_name_for(cluster: &str, entity: &str) -> String {
    format!("ceph-{cluster}-{}-keyring", entity.trim_matches('.'))
}

pub fn generate_key() -> [u8; 16] {
    let mut key = [0u8; 16];
    rand::rng().fill_bytes(&mut key);
    key
}

#[derive(Debug, Clone)]
pub struct Keyring {
    pub entity: String,
    pub key: String,
    pub caps: BTreeMap<String, String>,
}

impl Keyring {
    pub fn new(entity: impl Into<String>, key: [u8; 16], caps: BTreeMap<String, String>) -> Self {
        let now = Utc::now();
        let encoded = encode_key(
            &key,
            now.timestamp() as i32,
            now.timestamp_subsec_nanos() as i32,
        );
        Self {
            entity: entity.into(),
            key: encoded,
            caps,
        }
    }

    pub fn client_admin(key: [u8; 16]) -> Self {
        let mut caps = BTreeMap::new();
        caps.insert("mds".to_string(), "allow".to_string());
        caps.insert("mon".to_string(), "allow *".to_string());
        caps.insert("osd".to_string(), "allow *".to_string());
        Self::new("client.admin", key, caps)
    }

    pub fn mon(key: [u8; 16]) -> Self {
        let mut caps = BTreeMap::new();
        caps.insert("mon".to_string(), "allow *".to_string());
        Self::new("mon.", key, caps)
    }

    /// A bootstrap keyring used by worker daemon pods to authenticate against
    /// the cluster before they have their own keys minted. Not present in the
    /// original scaffold (only referenced by name there); the caps mirror the
    /// upstream `bootstrap-<type>` profile convention.
    pub fn bootstrap(daemon_type: &str, key: [u8; 16]) -> Self {
        let mut caps = BTreeMap::new();
        caps.insert(
            "mon".to_string(),
            format!("allow profile bootstrap-{daemon_type}"),
        );
        Self::new(format!("client.bootstrap-{daemon_type}"), key, caps)
    }

    /// Mirrors Go's `strings.Trim(entity, ".")`: strips leading/trailing dots
    /// only, so `"client.admin"` is unchanged but `"mon."` becomes `"mon"`.
    pub fn secret_name(&self, cluster: &str) -> String {
        secret_name_for(cluster, &self.entity)
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("[{}]\n", self.entity));
        out.push_str(&format!("    key = {}\n", self.key));
        for (cap, value) in &self.caps {
            out.push_str(&format!("    caps {cap} = \"{value}\"\n"));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_key_matches_scenario_s2() {
        let key: [u8; 16] = [
            0x22, 0x8f, 0xba, 0x7d, 0xe7, 0x49, 0xed, 0x34, 0xb3, 0x38, 0xaa, 0x00, 0xc3, 0xa2,
            0x2f, 0x9a,
        ];
        let encoded = encode_key(&key, 1546553005, 75622);
        assert_eq!(encoded, "AQCthi5cZicBABAAIo+6fedJ7TSzOKoAw6Ivmg==");
    }

    #[test]
    fn secret_name_trims_only_leading_trailing_dots() {
        let admin = Keyring::client_admin(generate_key());
        assert_eq!(admin.secret_name("rook"), "ceph-rook-client.admin-keyring");

        let mon = Keyring::mon(generate_key());
        assert_eq!(mon.secret_name("rook"), "ceph-rook-mon-keyring");
    }

    #[test]
    fn render_includes_all_caps() {
        let admin = Keyring::client_admin(generate_key());
        let rendered = admin.render();
        assert!(rendered.starts_with("[client.admin]\n"));
        assert!(rendered.contains("caps mds = \"allow\""));
        assert!(rendered.contains("caps mon = \"allow *\""));
        assert!(rendered.contains("caps osd = \"allow *\""));
    }
}
