use serde::Deserialize;

/// Environment variable through which the Functions host assigns the port of
/// a custom handler.
pub const CUSTOM_HANDLER_PORT_ENV: &str = "FUNCTIONS_CUSTOMHANDLER_PORT";

/// HTTP server bind configuration.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on. Overridden by `FUNCTIONS_CUSTOMHANDLER_PORT` when
    /// running under the Functions host.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Maximum time to wait for in-flight invocations during shutdown.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            shutdown_timeout_seconds: default_shutdown_timeout(),
        }
    }
}

impl ServerConfig {
    /// Apply the port assigned by the Functions host, if any. Values that
    /// are not a valid port are ignored.
    pub fn apply_custom_handler_port(&mut self, value: Option<&str>) -> bool {
        match value.and_then(|v| v.trim().parse::<u16>().ok()) {
            Some(port) => {
                self.port = port;
                true
            }
            None => false,
        }
    }
}

fn default_shutdown_timeout() -> u64 {
    30
}

fn default_host() -> String {
    "127.0.0.1".to_owned()
}

fn default_port() -> u16 {
    8080
}
