//! Study manifest: a JSON record of one generation run.
//!
//! Captures:
//! - When the configs were generated and with which seed
//! - Every participant assignment
//! - Balance counts (participants per paradigm, task per block position)

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::assignment::{InterruptionParadigm, ParticipantAssignment, TaskSetting};
use crate::plan::{paradigm_counts, StudyPlan};

/// Counterbalancing summary across all participants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSummary {
    pub participants: usize,
    pub per_paradigm: BTreeMap<InterruptionParadigm, usize>,
    /// `block_positions[task][b]` = participants running `task` in block `b + 1`
    pub block_positions: BTreeMap<TaskSetting, Vec<usize>>,
}

impl BalanceSummary {
    pub fn compute(participants: &[ParticipantAssignment]) -> Self {
        let mut block_positions: BTreeMap<TaskSetting, Vec<usize>> = TaskSetting::ALL
            .iter()
            .map(|t| (*t, vec![0; TaskSetting::ALL.len()]))
            .collect();

        for p in participants {
            for (position, task) in p.task_order().iter().enumerate() {
                if let Some(slot) = block_positions
                    .get_mut(task)
                    .and_then(|counts| counts.get_mut(position))
                {
                    *slot += 1;
                }
            }
        }

        Self {
            participants: participants.len(),
            per_paradigm: paradigm_counts(participants),
            block_positions,
        }
    }

    /// True when every task occupies every block position equally often.
    pub fn is_position_balanced(&self) -> bool {
        let mut counts = self.block_positions.values().flatten();
        match counts.next() {
            Some(first) => counts.all(|c| c == first),
            None => true,
        }
    }
}

/// Everything needed to audit a generated study after the fact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyManifest {
    pub generated_at: DateTime<Utc>,
    pub seed: Option<u64>,
    pub participants: Vec<ParticipantAssignment>,
    pub summary: BalanceSummary,
}

impl StudyManifest {
    pub fn from_plan(plan: &StudyPlan, seed: Option<u64>) -> Self {
        Self {
            generated_at: Utc::now(),
            seed,
            participants: plan.participants().to_vec(),
            summary: BalanceSummary::compute(plan.participants()),
        }
    }

    /// Save the manifest to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write manifest {}", path.display()))?;
        Ok(())
    }

    /// Load a manifest from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest {}", path.display()))?;
        let manifest = serde_json::from_str(&json)
            .with_context(|| format!("Invalid manifest {}", path.display()))?;
        Ok(manifest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::randomizer::TrafficRandomizer;

    #[test]
    fn test_summary_for_full_study() {
        let plan = StudyPlan::build(&mut TrafficRandomizer::new(Some(8))).unwrap();
        let summary = BalanceSummary::compute(plan.participants());

        assert_eq!(summary.participants, 18);
        assert_eq!(summary.per_paradigm.len(), 3);
        assert!(summary.per_paradigm.values().all(|&c| c == 6));
        assert_eq!(summary.block_positions[&TaskSetting::One], vec![6, 6, 6]);
        assert!(summary.is_position_balanced());
    }

    #[test]
    fn test_summary_detects_imbalance() {
        let plan = StudyPlan::build(&mut TrafficRandomizer::new(Some(8))).unwrap();
        let summary = BalanceSummary::compute(&plan.participants()[..1]);

        assert_eq!(summary.participants, 1);
        assert!(!summary.is_position_balanced());
    }

    #[test]
    fn test_empty_summary_is_balanced() {
        let summary = BalanceSummary::compute(&[]);
        assert_eq!(summary.participants, 0);
        assert!(summary.per_paradigm.is_empty());
        assert!(summary.is_position_balanced());
    }

    #[test]
    fn test_manifest_json_keys_use_labels() {
        let plan = StudyPlan::build(&mut TrafficRandomizer::new(Some(8))).unwrap();
        let manifest = StudyManifest::from_plan(&plan, Some(8));
        let json = serde_json::to_value(&manifest).unwrap();

        assert_eq!(json["seed"], 8);
        assert_eq!(json["participants"][0]["id"], "P01");
        assert_eq!(json["summary"]["per_paradigm"]["SelfRegulated"], 6);
    }
}
