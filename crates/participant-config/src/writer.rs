//! Renders participant assignments into the simulator's INI format.
//!
//! Layout: a `[General]` section followed by one `[Block<b>Trial<t>]` section
//! per trial. Values are always double-quoted. Sections are separated by a
//! blank line and the document ends with a single newline.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use crate::assignment::{ParticipantAssignment, ParticipantId};

/// Default output directory for generated configs.
pub const DEFAULT_CONFIG_DIR: &str = "config_files";

/// Section holding participant-level settings.
pub const GENERAL_SECTION: &str = "General";

/// Only n-back tasks are used as NDRTs in this study.
pub const NDRT_TASK_TYPE: &str = "NBackTask";

/// Section name for a 1-based block and trial.
pub fn section_name(block: usize, trial: usize) -> String {
    format!("Block{}Trial{}", block, trial)
}

/// `<dir>/ExperimentConfig_<id>.ini`
pub fn config_path(dir: &Path, id: ParticipantId) -> PathBuf {
    dir.join(format!("ExperimentConfig_{}.ini", id))
}

/// Render an assignment to the config document text.
pub fn render_config(assignment: &ParticipantAssignment) -> String {
    let mut lines = vec![
        format!("[{}]", GENERAL_SECTION),
        format!("ParticipantID=\"{}\"", assignment.id()),
        "LogPerformance=\"True\"".to_string(),
        format!("InterruptionParadigm=\"{}\"", assignment.paradigm()),
        format!("CurrentBlock=\"{}\"", section_name(1, 1)),
        String::new(),
    ];

    for (block, task, levels) in assignment.blocks() {
        for (i, traffic) in levels.iter().enumerate() {
            lines.push(format!("[{}]", section_name(block, i + 1)));
            lines.push(format!("NDRTTaskType=\"{}\"", NDRT_TASK_TYPE));
            lines.push(format!("TaskSetting=\"{}\"", task));
            lines.push(format!("Traffic=\"{}\"", traffic));
            lines.push(String::new());
        }
    }

    lines.join("\n")
}

/// Write one participant's config into `dir`, creating `dir` if needed.
///
/// An existing file for the same participant is overwritten.
pub fn write_config(dir: &Path, assignment: &ParticipantAssignment) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create config directory {}", dir.display()))?;

    let path = config_path(dir, assignment.id());
    std::fs::write(&path, render_config(assignment))
        .with_context(|| format!("Failed to write {}", path.display()))?;

    debug!(
        participant = %assignment.id(),
        paradigm = %assignment.paradigm(),
        path = %path.display(),
        "Wrote participant config"
    );
    Ok(path)
}
