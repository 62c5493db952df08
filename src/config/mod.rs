#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::CliConfig;
pub use toml_config::TomlConfig;

#[cfg(feature = "cli")]
impl CliConfig {
    /// Loads the TOML configuration the command line points at.
    pub fn load_config(&self) -> crate::utils::error::Result<TomlConfig> {
        TomlConfig::load(&self.base_dir, self.config.as_deref())
    }
}
