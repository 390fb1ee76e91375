//! Reads generated config files back into typed assignments.
//!
//! The simulator looks values up by `(section, key)`; `ConfigDocument` offers
//! the same view. Converting a document into a `ParticipantAssignment` checks
//! everything the generator guarantees, which makes this the basis of the
//! `verify` command.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::debug;

use crate::assignment::{
    InterruptionParadigm, ParticipantAssignment, ParticipantId, TaskSetting, TrafficLevel,
};
use crate::writer::{config_path, section_name, GENERAL_SECTION, NDRT_TASK_TYPE};

const CONFIG_PREFIX: &str = "ExperimentConfig_";
const CONFIG_EXTENSION: &str = "ini";

/// Parsed `[section]` / `key="value"` document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigDocument {
    sections: BTreeMap<String, BTreeMap<String, String>>,
}

impl ConfigDocument {
    /// Parse document text.
    ///
    /// Blank lines and `;`/`#` comments are skipped. Values may be quoted.
    pub fn parse(text: &str) -> Result<Self> {
        let mut sections: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
        let mut current: Option<String> = None;

        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            let line_no = idx + 1;
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }

            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                let name = name.trim();
                if name.is_empty() {
                    bail!("Line {}: empty section name", line_no);
                }
                if sections.contains_key(name) {
                    bail!("Line {}: duplicate section [{}]", line_no, name);
                }
                sections.insert(name.to_string(), BTreeMap::new());
                current = Some(name.to_string());
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                bail!("Line {}: expected key=value, got {:?}", line_no, line);
            };
            let Some(section) = current.as_ref() else {
                bail!("Line {}: key {:?} outside of any section", line_no, key.trim());
            };

            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value);

            let key = key.trim();
            if let Some(entries) = sections.get_mut(section) {
                if entries.insert(key.to_string(), value.to_string()).is_some() {
                    bail!("Line {}: duplicate key {} in [{}]", line_no, key, section);
                }
            }
        }

        Ok(Self { sections })
    }

    /// Value of `key` in `section`, quotes removed.
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|entries| entries.get(key))
            .map(String::as_str)
    }

    pub fn has_section(&self, section: &str) -> bool {
        self.sections.contains_key(section)
    }

    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    fn require(&self, section: &str, key: &str) -> Result<&str> {
        match self.get(section, key) {
            Some(value) => Ok(value),
            None if !self.has_section(section) => bail!("Missing section [{}]", section),
            None => bail!("Missing key {} in [{}]", key, section),
        }
    }
}

impl TryFrom<&ConfigDocument> for ParticipantAssignment {
    type Error = anyhow::Error;

    fn try_from(doc: &ConfigDocument) -> Result<Self> {
        let id: ParticipantId = doc.require(GENERAL_SECTION, "ParticipantID")?.parse()?;
        let paradigm: InterruptionParadigm =
            doc.require(GENERAL_SECTION, "InterruptionParadigm")?.parse()?;
        let log_performance = doc.require(GENERAL_SECTION, "LogPerformance")?;
        if log_performance != "True" {
            bail!("{}: LogPerformance must be \"True\", got {:?}", id, log_performance);
        }

        let current = doc.require(GENERAL_SECTION, "CurrentBlock")?;
        if !doc.has_section(current) {
            bail!("CurrentBlock points at missing section [{}]", current);
        }

        let blocks = TaskSetting::ALL.len();
        let trials = TrafficLevel::ALL.len();

        if let Some(extra) = doc.section_names().find(|name| {
            *name != GENERAL_SECTION && !is_trial_section(name, blocks, trials)
        }) {
            bail!("Unexpected section [{}]", extra);
        }

        let mut task_order = Vec::with_capacity(blocks);
        let mut traffic_order = Vec::with_capacity(blocks);

        for block in 1..=blocks {
            let mut block_task: Option<TaskSetting> = None;
            let mut levels = Vec::with_capacity(trials);

            for trial in 1..=trials {
                let section = section_name(block, trial);
                let task_type = doc.require(&section, "NDRTTaskType")?;
                if task_type != NDRT_TASK_TYPE {
                    bail!("[{}]: unsupported NDRTTaskType {:?}", section, task_type);
                }

                let task: TaskSetting = doc.require(&section, "TaskSetting")?.parse()?;
                match block_task {
                    None => block_task = Some(task),
                    Some(first) if first != task => {
                        bail!("Block {} mixes task settings {} and {}", block, first, task)
                    }
                    Some(_) => {}
                }

                levels.push(doc.require(&section, "Traffic")?.parse::<TrafficLevel>()?);
            }

            if let Some(task) = block_task {
                task_order.push(task);
            }
            traffic_order.push(levels);
        }

        ParticipantAssignment::new(id, paradigm, task_order, traffic_order)
    }
}

fn is_trial_section(name: &str, blocks: usize, trials: usize) -> bool {
    (1..=blocks).any(|b| (1..=trials).any(|t| section_name(b, t) == name))
}

/// Parse config text into an assignment.
pub fn parse_assignment(text: &str) -> Result<ParticipantAssignment> {
    let doc = ConfigDocument::parse(text)?;
    ParticipantAssignment::try_from(&doc)
}

/// Read and validate a single config file.
pub fn read_assignment(path: &Path) -> Result<ParticipantAssignment> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_assignment(&text).with_context(|| format!("Invalid config {}", path.display()))
}

/// Read every `ExperimentConfig_*.ini` in `dir`, sorted by participant.
///
/// Fails if a file's name does not match the participant ID it contains.
pub fn verify_dir(dir: &Path) -> Result<Vec<ParticipantAssignment>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to list config directory {}", dir.display()))?;

    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let is_config = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(CONFIG_PREFIX))
            && path.extension().and_then(|e| e.to_str()) == Some(CONFIG_EXTENSION);
        if is_config {
            paths.push(path);
        }
    }

    let mut assignments = Vec::with_capacity(paths.len());
    for path in paths {
        let assignment = read_assignment(&path)?;
        if config_path(dir, assignment.id()) != path {
            bail!(
                "{} contains participant {}, file name does not match",
                path.display(),
                assignment.id()
            );
        }
        debug!(participant = %assignment.id(), path = %path.display(), "Verified config");
        assignments.push(assignment);
    }

    assignments.sort_by_key(|a| a.id());
    Ok(assignments)
}
