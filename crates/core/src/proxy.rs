//! Proxy Configuration Types
//!
//! Data types for proxy configuration shared by the LLM providers and the
//! artifact source client. The HTTP client factory lives in the
//! `failscope-llm` crate.

use serde::{Deserialize, Serialize};

/// Proxy protocol type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProxyProtocol {
    Http,
    Https,
    Socks5,
}

impl ProxyProtocol {
    /// Return the URL scheme string for this protocol.
    pub fn scheme(&self) -> &'static str {
        match self {
            ProxyProtocol::Http => "http",
            ProxyProtocol::Https => "https",
            ProxyProtocol::Socks5 => "socks5",
        }
    }
}

/// Proxy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    pub protocol: ProxyProtocol,
    pub host: String,
    pub port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Read from the config file but never written back out.
    #[serde(skip_serializing, default)]
    pub password: Option<String>,
}

impl ProxyConfig {
    /// Build the proxy URL string (without auth).
    pub fn url(&self) -> String {
        format!("{}://{}:{}", self.protocol.scheme(), self.host, self.port)
    }

    /// Check that the proxy points somewhere usable.
    pub fn validate(&self) -> Result<(), String> {
        if self.host.trim().is_empty() {
            return Err("proxy host must not be empty".to_string());
        }
        if self.port == 0 {
            return Err(format!("invalid proxy port for host {}", self.host));
        }
        if self.password.is_some() && self.username.is_none() {
            return Err("proxy password requires a username".to_string());
        }
        Ok(())
    }
}
