use crate::domain::ports::StructureRenderer;
use crate::utils::error::{Result, SiteError};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Depicts structures with the Open Babel command-line tool
/// (`obabel -:<SMILES> -osvg`), reading the SVG from stdout.
#[derive(Debug, Clone)]
pub struct OpenBabelRenderer {
    program: String,
    timeout: Duration,
}

impl OpenBabelRenderer {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }
}

impl Default for OpenBabelRenderer {
    fn default() -> Self {
        Self::new("obabel", Duration::from_secs(30))
    }
}

impl StructureRenderer for OpenBabelRenderer {
    async fn render_svg(&self, smiles: &str) -> Result<Option<String>> {
        let mut command = Command::new(&self.program);
        command
            .arg(format!("-:{}", smiles))
            .arg("-osvg")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(result) => result.map_err(|e| SiteError::RenderError {
                smiles: smiles.to_string(),
                message: format!("could not run {}: {}", self.program, e),
            })?,
            Err(_) => {
                return Err(SiteError::RenderError {
                    smiles: smiles.to_string(),
                    message: format!("{} timed out after {:?}", self.program, self.timeout),
                })
            }
        };

        if !output.status.success() {
            return Err(SiteError::RenderError {
                smiles: smiles.to_string(),
                message: format!(
                    "{} exited with {}: {}",
                    self.program,
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        let svg = String::from_utf8_lossy(&output.stdout).into_owned();
        if svg.contains("<svg") {
            Ok(Some(svg))
        } else {
            tracing::debug!(
                "{} produced no SVG for {}: {}",
                self.program,
                smiles,
                String::from_utf8_lossy(&output.stderr).trim()
            );
            Ok(None)
        }
    }
}

/// Used with `--no-images`: pages are written without structures.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledRenderer;

impl StructureRenderer for DisabledRenderer {
    async fn render_svg(&self, _smiles: &str) -> Result<Option<String>> {
        Ok(None)
    }

    fn is_enabled(&self) -> bool {
        false
    }
}
