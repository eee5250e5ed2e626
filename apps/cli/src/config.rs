use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

const CONFIG_DIR_NAME: &str = "ingest-portal";
const CONFIG_FILE_NAME: &str = "config.toml";
const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:3030";
const DEFAULT_RUN_NAME: &str = "Data Ingestion";

/// Settings persisted between runs. Every key is optional in the file
/// itself, so a hand-edited config with missing keys still loads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    #[serde(default = "default_server_url")]
    pub server_url: String,
    #[serde(default = "default_run_name")]
    pub run_name: String,
    pub notebook_path: Option<String>,
    pub service_principal: Option<String>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            run_name: default_run_name(),
            notebook_path: None,
            service_principal: None,
        }
    }
}

fn default_server_url() -> String {
    DEFAULT_SERVER_URL.to_string()
}

fn default_run_name() -> String {
    DEFAULT_RUN_NAME.to_string()
}

#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: CliConfig,
    pub file: PathBuf,
    pub created: bool,
}

pub fn load_or_create() -> Result<ConfigLoad, String> {
    load_or_create_in(&config_dir()?)
}

fn load_or_create_in(dir: &Path) -> Result<ConfigLoad, String> {
    let file = dir.join(CONFIG_FILE_NAME);
    match fs::read_to_string(&file) {
        Ok(contents) => {
            let config: CliConfig = toml::from_str(&contents)
                .map_err(|err| format!("parse config {}: {}", file.display(), err))?;
            Ok(ConfigLoad {
                config,
                file,
                created: false,
            })
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            let config = CliConfig::default();
            let contents = toml::to_string_pretty(&config)
                .map_err(|err| format!("serialize config: {}", err))?;
            fs::create_dir_all(dir)
                .map_err(|err| format!("create config dir {}: {}", dir.display(), err))?;
            fs::write(&file, contents)
                .map_err(|err| format!("write config {}: {}", file.display(), err))?;
            Ok(ConfigLoad {
                config,
                file,
                created: true,
            })
        }
        Err(err) => Err(format!("read config {}: {}", file.display(), err)),
    }
}

fn config_dir() -> Result<PathBuf, String> {
    let home = std::env::var("HOME").map_err(|err| format!("resolve HOME: {}", err))?;
    Ok(PathBuf::from(home).join(".config").join(CONFIG_DIR_NAME))
}
