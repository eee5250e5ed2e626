use portal_cloud::{CostConfig, JobsConfig, StorageConfig};

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:3030";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 256 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub max_upload_bytes: usize,
}

/// Everything the portal needs to talk to its upstreams, read from the
/// environment at startup. An empty variable counts as unset.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    pub storage: StorageConfig,
    pub cost: CostConfig,
    pub jobs: JobsConfig,
    pub server: ServerConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),
    #[error("invalid value for {name}: {message}")]
    InvalidVar {
        name: &'static str,
        message: String,
    },
}

impl PortalConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let storage = StorageConfig {
            account: require(&lookup, "AZURE_STORAGE_ACCOUNT_NAME")?,
            access_key: require(&lookup, "AZURE_STORAGE_ACCOUNT_KEY")?,
            container: require(&lookup, "AZURE_STORAGE_CONTAINER_NAME")?,
            endpoint: optional(&lookup, "AZURE_STORAGE_ENDPOINT"),
        };
        let cost = CostConfig {
            tenant_id: require(&lookup, "AZURE_TENANT_ID")?,
            client_id: require(&lookup, "AZURE_CLIENT_ID")?,
            client_secret: require(&lookup, "AZURE_CLIENT_SECRET")?,
            subscription_id: require(&lookup, "AZURE_SUBSCRIPTION_ID")?,
            resource_group: require(&lookup, "AZURE_RESOURCE_GROUP_NAME")?,
            management_endpoint: optional(&lookup, "AZURE_MANAGEMENT_ENDPOINT"),
            login_endpoint: optional(&lookup, "AZURE_LOGIN_ENDPOINT"),
        };
        let jobs = JobsConfig {
            instance_url: require(&lookup, "DATABRICKS_INSTANCE")?,
            token: require(&lookup, "DATABRICKS_TOKEN")?,
        };
        let server = ServerConfig {
            listen_addr: optional(&lookup, "PORTAL_LISTEN_ADDR")
                .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string()),
            max_upload_bytes: match optional(&lookup, "PORTAL_MAX_UPLOAD_BYTES") {
                Some(raw) => raw.parse().map_err(|err| ConfigError::InvalidVar {
                    name: "PORTAL_MAX_UPLOAD_BYTES",
                    message: format!("{err}"),
                })?,
                None => DEFAULT_MAX_UPLOAD_BYTES,
            },
        };
        Ok(Self {
            storage,
            cost,
            jobs,
            server,
        })
    }
}

fn require(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<String, ConfigError> {
    optional(lookup, name).ok_or(ConfigError::MissingVar(name))
}

fn optional(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name).filter(|value| !value.is_empty())
}
