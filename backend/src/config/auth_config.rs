use serde::Deserialize;
use std::collections::HashMap;

/// Bearer tokens accepted by the bundled static identity provider, mapped to
/// the participant id each one authenticates as.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub tokens: HashMap<String, String>,
}
