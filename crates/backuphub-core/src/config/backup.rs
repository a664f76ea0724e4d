//! Dump utility configuration.

use serde::{Deserialize, Serialize};

/// How the external database dump utility is invoked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DumpConfig {
    /// Executable name or path of the dump utility.
    #[serde(default = "default_binary")]
    pub binary: String,
    /// Environment variable through which the password is handed over.
    #[serde(default = "default_password_env")]
    pub password_env: String,
    /// Additional arguments appended after the connection parameters.
    #[serde(default)]
    pub extra_args: Vec<String>,
    /// Maximum attempts for an enqueued backup job.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: i32,
}

impl Default for DumpConfig {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            password_env: default_password_env(),
            extra_args: Vec::new(),
            max_attempts: default_max_attempts(),
        }
    }
}

fn default_binary() -> String {
    "pg_dumpall".to_string()
}

fn default_password_env() -> String {
    "PGPASSWORD".to_string()
}

fn default_max_attempts() -> i32 {
    1
}
