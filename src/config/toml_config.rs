use crate::domain::ports::ConfigProvider;
use crate::utils::error::{Result, ToolkitError};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "toolkit.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub paths: PathsConfig,
    pub compiler: CompilerConfig,
    pub invoice: InvoiceConfig,
    /// Directory relative paths are resolved against. Not part of the file.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub template: String,
    pub output_dir: String,
    pub ledger: String,
    pub money_flow: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            template: "invoiceTemplate.tex".to_string(),
            output_dir: ".".to_string(),
            ledger: "invoiceHistory.csv".to_string(),
            money_flow: "moneyFlow.csv".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    pub program: String,
    pub args: Vec<String>,
    pub timeout_seconds: u64,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            program: "xelatex".to_string(),
            args: vec![
                "-interaction=batchmode".to_string(),
                "-halt-on-error".to_string(),
            ],
            timeout_seconds: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InvoiceConfig {
    pub currency_symbol: String,
}

impl Default for InvoiceConfig {
    fn default() -> Self {
        Self {
            currency_symbol: "₹".to_string(),
        }
    }
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ToolkitError::IoError)?;
        let mut config = Self::from_toml_str(&content)?;
        config.base_dir = path
            .as_ref()
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok(config)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ToolkitError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Explicit file wins; otherwise `toolkit.toml` in `base_dir` if present; otherwise defaults.
    pub fn load(base_dir: &Path, explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => {
                tracing::debug!("Loading configuration from {}", path.display());
                Self::from_file(path)?
            }
            None => {
                let candidate = base_dir.join(DEFAULT_CONFIG_FILE);
                if candidate.is_file() {
                    tracing::debug!("Loading configuration from {}", candidate.display());
                    Self::from_file(&candidate)?
                } else {
                    tracing::debug!("No {} found, using defaults", candidate.display());
                    Self::default()
                }
            }
        };
        if explicit.is_none() || config.base_dir.as_os_str().is_empty() {
            config.base_dir = base_dir.to_path_buf();
        }
        Ok(config)
    }

    /// 替換環境變數 (例如 ${HOME})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}")
            .map_err(|e| ToolkitError::config(format!("invalid env pattern: {}", e)))?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ToolkitError::config(e.to_string()))
    }

    pub fn resolve(&self, path: &str) -> PathBuf {
        let candidate = PathBuf::from(path);
        if candidate.is_absolute() {
            candidate
        } else {
            self.base_dir.join(candidate)
        }
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_path("paths.template", &self.paths.template)?;
        validation::validate_path("paths.output_dir", &self.paths.output_dir)?;
        validation::validate_path("paths.ledger", &self.paths.ledger)?;
        validation::validate_path("paths.money_flow", &self.paths.money_flow)?;
        validation::validate_non_empty_string("compiler.program", &self.compiler.program)?;
        validation::validate_range("compiler.timeout_seconds", self.compiler.timeout_seconds, 1, 3600)?;

        if self.paths.ledger == self.paths.money_flow {
            return Err(ToolkitError::ConfigValidationError {
                field: "paths.money_flow".to_string(),
                message: "must differ from paths.ledger".to_string(),
            });
        }

        Ok(())
    }
}

impl ConfigProvider for TomlConfig {
    fn template_path(&self) -> PathBuf {
        self.resolve(&self.paths.template)
    }

    fn output_dir(&self) -> PathBuf {
        self.resolve(&self.paths.output_dir)
    }

    fn ledger_path(&self) -> PathBuf {
        self.resolve(&self.paths.ledger)
    }

    fn money_flow_path(&self) -> PathBuf {
        self.resolve(&self.paths.money_flow)
    }

    fn compiler_program(&self) -> &str {
        &self.compiler.program
    }

    fn compiler_args(&self) -> &[String] {
        &self.compiler.args
    }

    fn compile_timeout(&self) -> Duration {
        Duration::from_secs(self.compiler.timeout_seconds)
    }

    fn currency_symbol(&self) -> &str {
        &self.invoice.currency_symbol
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
