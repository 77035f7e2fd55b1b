//! Configuration for the skycat CLI
//!
//! External endpoints and command lines, overridable via environment
//! variables so tests can point everything at mocks.

use serde::{Deserialize, Serialize};

// ============================================================================
// Default endpoints and commands
// ============================================================================

/// Command line used to drive the CasJobs batch-job binary.
pub const DEFAULT_CASJOBS_CMD: &str = "java -jar casjobs.jar";

/// Command used to fetch a URL into the working directory.
pub const DEFAULT_TRANSFER_CMD: &str = "wget";

/// Datastore the CasJobs extract step publishes FITS files to.
pub const DEFAULT_CASJOBS_DATASTORE_URL: &str =
    "http://ps1images.stsci.edu/datadelivery/outgoing/casjobs/fits/";

/// PSPS authentication service endpoint.
pub const DEFAULT_PSPS_AUTH_URL: &str =
    "http://panstarrs.stsci.edu/DFetch/WSDL/AuthService.wsdl.php";

/// PSPS job management service endpoint.
pub const DEFAULT_PSPS_JOBS_URL: &str =
    "http://panstarrs.stsci.edu/DFetch/WSDL/JobsService.wsdl.php";

/// Datastore the PSPS extract job publishes FITS files to.
pub const DEFAULT_PSPS_DATASTORE_URL: &str =
    "http://ps1images.stsci.edu/datadelivery/outgoing/casjobs/psi/fits/";

/// Schema group queries run against on PSPS.
pub const DEFAULT_SCHEMA_GROUP: &str = "PS1_SCHEMA";

/// Database context for PSPS queries.
pub const DEFAULT_SCHEMA: &str = "PanSTARRS_3PI_PV3.1";

/// CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// CasJobs binary invocation
    pub casjobs_cmd: String,

    /// URL fetch command
    pub transfer_cmd: String,

    /// CasJobs FITS datastore base URL
    pub casjobs_datastore_url: String,

    /// PSPS auth service URL
    pub psps_auth_url: String,

    /// PSPS jobs service URL
    pub psps_jobs_url: String,

    /// PSPS FITS datastore base URL
    pub psps_datastore_url: String,

    /// PSPS schema group
    pub schema_group: String,

    /// PSPS query context
    pub schema: String,
}

impl Config {
    /// Load config from `SKYCAT_*` environment variables, falling back to
    /// the production defaults for anything unset.
    pub fn from_env() -> Self {
        let var = |name: &str, default: &str| {
            std::env::var(name).unwrap_or_else(|_| default.to_string())
        };

        Self {
            casjobs_cmd: var("SKYCAT_CASJOBS_CMD", DEFAULT_CASJOBS_CMD),
            transfer_cmd: var("SKYCAT_TRANSFER_CMD", DEFAULT_TRANSFER_CMD),
            casjobs_datastore_url: var(
                "SKYCAT_CASJOBS_DATASTORE_URL",
                DEFAULT_CASJOBS_DATASTORE_URL,
            ),
            psps_auth_url: var("SKYCAT_PSPS_AUTH_URL", DEFAULT_PSPS_AUTH_URL),
            psps_jobs_url: var("SKYCAT_PSPS_JOBS_URL", DEFAULT_PSPS_JOBS_URL),
            psps_datastore_url: var("SKYCAT_PSPS_DATASTORE_URL", DEFAULT_PSPS_DATASTORE_URL),
            schema_group: var("SKYCAT_SCHEMA_GROUP", DEFAULT_SCHEMA_GROUP),
            schema: var("SKYCAT_SCHEMA", DEFAULT_SCHEMA),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            casjobs_cmd: DEFAULT_CASJOBS_CMD.to_string(),
            transfer_cmd: DEFAULT_TRANSFER_CMD.to_string(),
            casjobs_datastore_url: DEFAULT_CASJOBS_DATASTORE_URL.to_string(),
            psps_auth_url: DEFAULT_PSPS_AUTH_URL.to_string(),
            psps_jobs_url: DEFAULT_PSPS_JOBS_URL.to_string(),
            psps_datastore_url: DEFAULT_PSPS_DATASTORE_URL.to_string(),
            schema_group: DEFAULT_SCHEMA_GROUP.to_string(),
            schema: DEFAULT_SCHEMA.to_string(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.casjobs_cmd, DEFAULT_CASJOBS_CMD);
        assert_eq!(config.schema_group, "PS1_SCHEMA");
        assert!(config.psps_datastore_url.ends_with('/'));
        assert!(config.casjobs_datastore_url.ends_with('/'));
    }

    #[test]
    fn test_env_override() {
        std::env::set_var("SKYCAT_CASJOBS_CMD", "casjobs");
        let config = Config::from_env();
        assert_eq!(config.casjobs_cmd, "casjobs");
        std::env::remove_var("SKYCAT_CASJOBS_CMD");
    }
}
