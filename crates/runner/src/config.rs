use std::path::PathBuf;

use lgr_core::command::Interpreter;
use lgr_core::error::CoreError;
use lgr_core::job::JobEnvironment;

/// Where produced files end up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Move into `<data>/out/files` with a manifest per file.
    Local,
    /// Upload to the Storage API and record the returned id.
    Storage,
}

impl OutputMode {
    fn parse(value: &str) -> Result<Self, CoreError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "storage" => Ok(Self::Storage),
            other => Err(CoreError::Input(format!(
                "OUTPUT_MODE must be 'local' or 'storage', got '{other}'."
            ))),
        }
    }
}

/// Runner configuration loaded from environment variables.
///
/// Loaded once at startup and passed by reference to everything that
/// needs it.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Interpreter, script directory and database driver.
    pub interpreter: Interpreter,
    /// Credential Provider base URL.
    pub provisioning_url: String,
    /// Storage API base URL, used for uploads and events.
    pub storage_api_url: String,
    /// Token fallback when the descriptor carries none.
    pub token: Option<String>,
    /// Run id fallback when the descriptor carries none.
    pub run_id: Option<String>,
    /// `true` when `APP_ENV=dev`.
    pub dev_mode: bool,
    pub output_mode: OutputMode,
    /// Parent directory for per-run working directories.
    pub work_dir_root: PathBuf,
    /// Forward events to the Storage API.
    pub events_enabled: bool,
}

impl RunnerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var            | Default                                   |
    /// |--------------------|-------------------------------------------|
    /// | `RSCRIPT_PATH`     | `Rscript`                                 |
    /// | `R_SCRIPT_DIR`     | `RScripts`                                |
    /// | `DB_DRIVER_PATH`   | `Resources/RedshiftJDBC41-1.1.9.1009.jar` |
    /// | `PROVISIONING_URL` | `https://syrup.keboola.com/provisioning`  |
    /// | `STORAGE_API_URL`  | `https://connection.keboola.com`          |
    /// | `KBC_TOKENID`      | none                                      |
    /// | `KBC_RUNID`        | none                                      |
    /// | `APP_ENV`          | `prod`                                    |
    /// | `OUTPUT_MODE`      | `local`                                   |
    /// | `WORK_DIR_ROOT`    | system temp directory                     |
    /// | `EVENTS_ENABLED`   | `true`                                    |
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let or = |key: &str, default: &str| var(key).unwrap_or_else(|| default.to_string());

        let interpreter = Interpreter {
            executable: PathBuf::from(or("RSCRIPT_PATH", "Rscript")),
            script_dir: PathBuf::from(or("R_SCRIPT_DIR", "RScripts")),
            db_driver: PathBuf::from(or(
                "DB_DRIVER_PATH",
                "Resources/RedshiftJDBC41-1.1.9.1009.jar",
            )),
        };

        let output_mode = match var("OUTPUT_MODE") {
            Some(value) => OutputMode::parse(&value)?,
            None => OutputMode::Local,
        };

        let events_enabled = match var("EVENTS_ENABLED") {
            Some(value) => parse_bool("EVENTS_ENABLED", &value)?,
            None => true,
        };

        let work_dir_root = var("WORK_DIR_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir);

        Ok(Self {
            interpreter,
            provisioning_url: or("PROVISIONING_URL", "https://syrup.keboola.com/provisioning"),
            storage_api_url: or("STORAGE_API_URL", "https://connection.keboola.com"),
            token: var("KBC_TOKENID"),
            run_id: var("KBC_RUNID"),
            dev_mode: or("APP_ENV", "prod").eq_ignore_ascii_case("dev"),
            output_mode,
            work_dir_root,
            events_enabled,
        })
    }

    /// Fallbacks used when validating a job descriptor.
    pub fn job_environment(&self) -> JobEnvironment {
        JobEnvironment {
            token: self.token.clone(),
            run_id: self.run_id.clone(),
            debug_default: self.dev_mode,
        }
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, CoreError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(CoreError::Input(format!(
            "{key} must be a boolean, got '{value}'."
        ))),
    }
}
