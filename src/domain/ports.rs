use crate::domain::model::CompiledArtifact;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub trait ConfigProvider: Send + Sync {
    fn template_path(&self) -> PathBuf;
    fn output_dir(&self) -> PathBuf;
    fn ledger_path(&self) -> PathBuf;
    fn money_flow_path(&self) -> PathBuf;
    fn compiler_program(&self) -> &str;
    fn compiler_args(&self) -> &[String];
    fn compile_timeout(&self) -> Duration;
    fn currency_symbol(&self) -> &str;
}

/// Turns a rendered document on disk into its final artifact.
#[async_trait]
pub trait DocumentCompiler: Send + Sync {
    fn artifact_path(&self, source: &Path) -> PathBuf {
        source.with_extension("pdf")
    }

    async fn compile(&self, source: &Path) -> Result<CompiledArtifact>;
}
