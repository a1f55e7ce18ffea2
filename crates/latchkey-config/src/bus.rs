//! Message-bus connection settings.

use serde::{Deserialize, Serialize};

/// Broker connection settings.
///
/// The topic family itself is derived from `client_id` by the bus crate;
/// this struct only carries what is needed to open the connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Client identifier; also the root of the topic family.
    pub client_id: String,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 1883,
            username: None,
            password: None,
            client_id: "latchkey".into(),
        }
    }
}
