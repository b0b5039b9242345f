use std::collections::BTreeMap;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;

use super::Error;

/// Parses a comma-separated `key=value` selector string, as used for PV
/// selection in Mon/Daemon/Osd specs. A malformed selector is a protocol
/// violation per the error taxonomy: return an error rather than guess.
pub fn parse_selector(raw: &str) -> Result<LabelSelector, Error> {
    let mut match_labels = BTreeMap::new();
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(LabelSelector {
            match_labels: Some(match_labels),
            ..Default::default()
        });
    }
    for pair in trimmed.split(',') {
        let (k, v) = pair.split_once('=').ok_or_else(|| {
            Error::UserInput(format!("malformed PV selector clause: {pair}"))
        })?;
        match_labels.insert(k.trim().to_string(), v.trim().to_string());
    }
    Ok(LabelSelector {
        match_labels: Some(match_labels),
        ..Default::default()
    })
}
