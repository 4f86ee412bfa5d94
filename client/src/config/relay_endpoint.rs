use serde::Deserialize;

/// Where the relay lives and how to prove who we are to it.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RelayEndpoint {
    pub address: String,
    pub port: u16,
    pub enable_tls: bool,
    /// Accept self-signed relay certificates. Development only.
    pub accept_invalid_certs: bool,
    pub auth_token: String,
    pub connect_timeout_secs: u64,
}

impl Default for RelayEndpoint {
    fn default() -> Self {
        RelayEndpoint {
            address: "127.0.0.1".to_string(),
            port: 8443,
            enable_tls: false,
            accept_invalid_certs: false,
            auth_token: String::new(),
            connect_timeout_secs: 10,
        }
    }
}

impl RelayEndpoint {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}
