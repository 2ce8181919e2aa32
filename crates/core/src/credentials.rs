//! Warehouse connection credentials.
//!
//! Fetched once per job from the Credential Provider and held only in
//! memory. The password never appears in `Debug` output.

use std::fmt;

use serde::Deserialize;

/// Network port of the Redshift warehouse.
pub const REDSHIFT_DB_PORT: u16 = 5439;

/// Replacement text used wherever the password would otherwise be logged.
pub const PASSWORD_MASK: &str = "*****";

fn default_port() -> u16 {
    REDSHIFT_DB_PORT
}

/// Warehouse credentials for one job.
#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub hostname: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub db: String,
    pub schema: String,
    pub user: String,
    pub password: String,
}

impl Credentials {
    /// JDBC connection string handed to the interpreter's DB driver.
    pub fn jdbc_url(&self) -> String {
        format!(
            "jdbc:postgresql://{}:{}/{}",
            self.hostname, self.port, self.db
        )
    }

    /// Replace every occurrence of the password in `text` with [`PASSWORD_MASK`].
    pub fn mask(&self, text: &str) -> String {
        if self.password.is_empty() {
            return text.to_string();
        }
        text.replace(&self.password, PASSWORD_MASK)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("hostname", &self.hostname)
            .field("port", &self.port)
            .field("db", &self.db)
            .field("schema", &self.schema)
            .field("user", &self.user)
            .field("password", &PASSWORD_MASK)
            .finish()
    }
}
