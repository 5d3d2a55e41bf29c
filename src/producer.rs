//! Artifact production for a single job.
//!
//! The geometry itself is OpenSCAD's business. [`ScadProducer`] renders a
//! small KeyV2 script for the job, hands it to the `openscad` executable and
//! checks that the requested output file appeared.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use thiserror::Error;
use tracing::{debug, info};

use crate::catalog::{Job, Profile};
use crate::config::GenConfig;

/// Directory under the target directory that holds rendered scripts.
const SCAD_DIR: &str = "scad";

const HEADER: &str = r#"include <KeyV2/includes.scad>
$support_type = "disable";
$stem_support_type = "disable";
"#;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("IO error while generating {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to run {tool}: {source}")]
    Launch {
        tool: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} exited with {status}: {stderr}")]
    ToolFailed {
        tool: PathBuf,
        status: String,
        stderr: String,
    },

    #[error("{tool} reported success but did not write {path}")]
    MissingOutput { tool: PathBuf, path: PathBuf },
}

/// A generated file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub bytes: u64,
}

/// Turns a job into an artifact on disk.
pub trait ArtifactProducer {
    fn produce(&self, job: &Job) -> Result<Artifact, GenerationError>;
}

/// OpenSCAD source for `job`, using the KeyV2 library.
pub fn render_scad(job: &Job) -> String {
    let stem = if job.profile == Profile::Choc {
        "$stem_type = \"choc\";\n"
    } else {
        ""
    };
    let row = job.effective_row().map(|r| r.to_string()).unwrap_or_default();
    format!("{HEADER}{stem}u({}) {}_row({row}) key();\n", job.u, job.profile)
}

/// Produces models by running the `openscad` command line tool.
#[derive(Debug, Clone)]
pub struct ScadProducer {
    openscad: PathBuf,
    library_dir: PathBuf,
    target_dir: PathBuf,
    format: String,
}

impl ScadProducer {
    pub fn from_config(config: &GenConfig) -> Self {
        Self {
            openscad: config.openscad.clone(),
            library_dir: config.library_dir().to_path_buf(),
            target_dir: config.target_dir.clone(),
            format: config.format.clone(),
        }
    }

    /// Where the model for `job` is written.
    pub fn output_path(&self, job: &Job) -> PathBuf {
        self.target_dir
            .join(format!("key-{}.{}", job.artifact_stem(), self.format))
    }

    fn write_script(&self, job: &Job) -> Result<PathBuf, GenerationError> {
        let dir = self.target_dir.join(SCAD_DIR);
        let path = dir.join(format!("{}.scad", job.artifact_stem()));
        fs::create_dir_all(&dir).map_err(|source| io_error(&dir, source))?;
        fs::write(&path, render_scad(job)).map_err(|source| io_error(&path, source))?;
        Ok(path)
    }
}

fn io_error(path: &Path, source: std::io::Error) -> GenerationError {
    GenerationError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Deletes a model left by an earlier run so only fresh output counts.
fn remove_stale(output: &Path) -> Result<(), GenerationError> {
    match fs::remove_file(output) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(io_error(output, e)),
        _ => Ok(()),
    }
}

impl ArtifactProducer for ScadProducer {
    fn produce(&self, job: &Job) -> Result<Artifact, GenerationError> {
        let script = self.write_script(job)?;
        let output = self.output_path(job);
        remove_stale(&output)?;
        debug!(script = %script.display(), output = %output.display(), "running openscad");

        let result = Command::new(&self.openscad)
            .arg(&script)
            .arg("-o")
            .arg(&output)
            .env("OPENSCADPATH", &self.library_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| GenerationError::Launch {
                tool: self.openscad.clone(),
                source,
            })?;

        if !result.status.success() {
            return Err(GenerationError::ToolFailed {
                tool: self.openscad.clone(),
                status: result.status.to_string(),
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }

        let bytes = match fs::metadata(&output) {
            Ok(meta) => meta.len(),
            Err(_) => {
                return Err(GenerationError::MissingOutput {
                    tool: self.openscad.clone(),
                    path: output,
                });
            }
        };
        info!(job = %job, path = %output.display(), bytes, "artifact written");
        Ok(Artifact {
            path: output,
            bytes,
        })
    }
}
