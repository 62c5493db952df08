use crate::domain::model::CompiledArtifact;
use crate::domain::ports::{ConfigProvider, DocumentCompiler};
use crate::utils::error::{Result, ToolkitError};
use crate::utils::format::tail_chars;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Byproducts moved into `log/` after a successful run.
pub const AUX_EXTENSIONS: [&str; 6] = [".aux", ".log", ".out", ".fls", ".fdb_latexmk", ".synctex.gz"];
const MAX_DIAGNOSTIC_LINES: usize = 10;
const MAX_OUTPUT_CHARS: usize = 1000;
const LOG_DIR_NAME: &str = "log";

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

#[derive(Debug, Clone)]
pub struct LatexCompiler {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl LatexCompiler {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }

    pub fn from_config<C: ConfigProvider + ?Sized>(config: &C) -> Self {
        Self::new(
            config.compiler_program(),
            config.compiler_args().to_vec(),
            config.compile_timeout(),
        )
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn command(&self, work_dir: &Path, file_name: &str) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg(file_name)
            .current_dir(work_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(windows)]
        command.creation_flags(CREATE_NO_WINDOW);
        command
    }
}

#[async_trait]
impl DocumentCompiler for LatexCompiler {
    async fn compile(&self, source: &Path) -> Result<CompiledArtifact> {
        let work_dir = source
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let file_name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| ToolkitError::validation(format!("{} is not a file", source.display())))?;
        let artifact = self.artifact_path(source);

        // A leftover artifact from an earlier run must not count as success.
        if artifact.exists() {
            std::fs::remove_file(&artifact).map_err(|e| {
                tracing::error!("Could not remove stale {}: {}", artifact.display(), e);
                ToolkitError::IoError(std::io::Error::new(
                    e.kind(),
                    format!("could not remove stale {}: {}", artifact.display(), e),
                ))
            })?;
        }

        tracing::info!("Running {} on {}", self.program, source.display());
        let child = match self.command(&work_dir, &file_name).spawn() {
            Ok(child) => child,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ToolkitError::ToolchainMissing {
                    program: self.program.clone(),
                });
            }
            Err(e) => return Err(ToolkitError::IoError(e)),
        };

        // Dropping the wait future on timeout kills the child (kill_on_drop).
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(ToolkitError::CompileTimeout {
                    program: self.program.clone(),
                    seconds: self.timeout.as_secs(),
                });
            }
        };

        let exit_code = output.status.code();
        if !artifact.exists() {
            let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
            combined.push_str(&String::from_utf8_lossy(&output.stderr));
            let output_tail = if combined.trim().is_empty() {
                "No output".to_string()
            } else {
                tail_chars(&combined, MAX_OUTPUT_CHARS).to_string()
            };
            let diagnostics = read_log_diagnostics(&log_file_path(source));
            tracing::error!(
                "{} exited with {:?} and produced no {}",
                self.program,
                exit_code,
                artifact.display()
            );
            return Err(ToolkitError::CompileFailed {
                program: self.program.clone(),
                exit_code,
                output_tail,
                diagnostics,
            });
        }

        let warnings = !output.status.success();
        if warnings {
            tracing::warn!(
                "{} exited with {:?} but produced {}, treating as success with warnings",
                self.program,
                exit_code,
                artifact.display()
            );
        }

        relocate_aux_files(source);

        Ok(CompiledArtifact {
            path: artifact,
            exit_code,
            warnings,
        })
    }
}

fn log_file_path(source: &Path) -> PathBuf {
    source.with_extension("log")
}

/// Last lines of the compiler log that look like errors. Missing or unreadable log → empty.
pub fn read_log_diagnostics(log_path: &Path) -> Vec<String> {
    let Ok(bytes) = std::fs::read(log_path) else {
        return Vec::new();
    };
    let content = String::from_utf8_lossy(&bytes);
    extract_error_lines(&content)
}

pub fn extract_error_lines(log: &str) -> Vec<String> {
    let matching: Vec<&str> = log
        .lines()
        .filter(|line| line.contains('!') || line.contains("Error") || line.contains("Fatal"))
        .collect();
    let start = matching.len().saturating_sub(MAX_DIAGNOSTIC_LINES);
    matching[start..].iter().map(|line| line.to_string()).collect()
}

/// Best effort: every failure here is logged and ignored.
pub fn relocate_aux_files(source: &Path) {
    let Some(work_dir) = source.parent() else {
        return;
    };
    let Some(stem) = source.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
        return;
    };
    let log_dir = work_dir.join(LOG_DIR_NAME);
    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        tracing::debug!("Could not create {}: {}", log_dir.display(), e);
        return;
    }

    for ext in AUX_EXTENSIONS {
        let file_name = format!("{}{}", stem, ext);
        let from = work_dir.join(&file_name);
        if !from.exists() {
            continue;
        }
        let to = log_dir.join(&file_name);
        match std::fs::rename(&from, &to) {
            Ok(()) => tracing::debug!("Moved {} to {}", from.display(), to.display()),
            Err(e) => tracing::debug!("Could not move {}: {}", from.display(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_error_lines_keeps_last_ten() {
        let mut log = String::from("This is XeTeX\nentering extended mode\n");
        for i in 0..12 {
            log.push_str(&format!("! Error number {}\n", i));
            log.push_str("l.42 some context\n");
        }
        log.push_str("Fatal error occurred, no output PDF file produced!\n");

        let lines = extract_error_lines(&log);
        assert_eq!(lines.len(), 10);
        assert_eq!(lines[0], "! Error number 3");
        assert_eq!(lines[9], "Fatal error occurred, no output PDF file produced!");
    }

    #[test]
    fn test_extract_error_lines_none() {
        assert!(extract_error_lines("all good\nOutput written\n").is_empty());
    }

    #[test]
    fn test_missing_log_yields_no_diagnostics() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(read_log_diagnostics(&dir.path().join("missing.log")).is_empty());
    }

    #[test]
    fn test_relocate_aux_files() {
        let dir = tempfile::TempDir::new().unwrap();
        let source = dir.path().join("invoice_7.tex");
        std::fs::write(&source, "tex").unwrap();
        std::fs::write(dir.path().join("invoice_7.aux"), "aux").unwrap();
        std::fs::write(dir.path().join("invoice_7.log"), "log").unwrap();
        std::fs::write(dir.path().join("invoice_7.synctex.gz"), "gz").unwrap();
        std::fs::write(dir.path().join("invoice_7.pdf"), "pdf").unwrap();

        relocate_aux_files(&source);

        let log_dir = dir.path().join("log");
        assert!(log_dir.join("invoice_7.aux").exists());
        assert!(log_dir.join("invoice_7.log").exists());
        assert!(log_dir.join("invoice_7.synctex.gz").exists());
        assert!(!dir.path().join("invoice_7.aux").exists());
        assert!(source.exists());
        assert!(dir.path().join("invoice_7.pdf").exists());
    }

    #[test]
    fn test_relocate_ignores_unwritable_log_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        let source = dir.path().join("invoice_8.tex");
        std::fs::write(dir.path().join("invoice_8.aux"), "aux").unwrap();
        // A file named `log` blocks the directory.
        std::fs::write(dir.path().join("log"), "not a dir").unwrap();

        relocate_aux_files(&source);

        assert!(dir.path().join("invoice_8.aux").exists());
    }

    #[tokio::test]
    async fn test_missing_toolchain() {
        let dir = tempfile::TempDir::new().unwrap();
        let source = dir.path().join("invoice_1.tex");
        std::fs::write(&source, "tex").unwrap();
        std::fs::write(dir.path().join("invoice_1.log"), "! Should not be read\n").unwrap();

        let compiler = LatexCompiler::new(
            "solo-toolkit-no-such-latex",
            vec![],
            Duration::from_secs(5),
        );
        match compiler.compile(&source).await {
            Err(ToolkitError::ToolchainMissing { program }) => {
                assert_eq!(program, "solo-toolkit-no-such-latex")
            }
            other => panic!("expected ToolchainMissing, got {:?}", other),
        }
    }
}
