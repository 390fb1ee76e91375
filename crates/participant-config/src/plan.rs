//! Study plan: who gets which paradigm, task order and traffic order.
//!
//! Participants are numbered in generation order. The outer loop walks the
//! six Latin-square task orders (square rows, then transpose rows); the inner
//! loop hands out the three interruption paradigms in fixed order. That gives
//! every (task order, paradigm) pair exactly one participant.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::info;

use crate::assignment::{InterruptionParadigm, ParticipantAssignment, ParticipantId};
use crate::config::GeneratorConfig;
use crate::design::study_task_orders;
use crate::randomizer::TrafficRandomizer;
use crate::writer::write_config;

/// All participant assignments for one study.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudyPlan {
    participants: Vec<ParticipantAssignment>,
}

impl StudyPlan {
    /// Build the full plan, drawing one traffic order per participant.
    pub fn build(randomizer: &mut TrafficRandomizer) -> Result<Self> {
        let mut participants = Vec::new();
        let mut counter = 1;

        for task_order in study_task_orders() {
            for paradigm in InterruptionParadigm::ALL {
                let traffic_order = randomizer.traffic_order(task_order.len());
                participants.push(ParticipantAssignment::new(
                    ParticipantId::new(counter),
                    paradigm,
                    task_order.clone(),
                    traffic_order,
                )?);
                counter += 1;
            }
        }

        Ok(Self { participants })
    }

    pub fn participants(&self) -> &[ParticipantAssignment] {
        &self.participants
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// Write every participant's config into `dir`, in participant order.
    pub fn write_all(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        self.participants
            .iter()
            .map(|assignment| write_config(dir, assignment))
            .collect()
    }

    /// Participant count per paradigm.
    pub fn paradigm_counts(&self) -> BTreeMap<InterruptionParadigm, usize> {
        paradigm_counts(&self.participants)
    }
}

impl fmt::Display for StudyPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Study plan ({} participants)", self.participants.len())?;
        for p in &self.participants {
            let tasks: Vec<&str> = p.task_order().iter().map(|t| t.label()).collect();
            let traffic: Vec<String> = p
                .traffic_order()
                .iter()
                .map(|levels| {
                    levels
                        .iter()
                        .map(|l| l.label())
                        .collect::<Vec<_>>()
                        .join(",")
                })
                .collect();
            writeln!(
                f,
                "  {} {:<17} tasks=[{}] traffic=[{}]",
                p.id(),
                p.paradigm().label(),
                tasks.join(" "),
                traffic.join(" | ")
            )?;
        }
        Ok(())
    }
}

pub(crate) fn paradigm_counts(
    participants: &[ParticipantAssignment],
) -> BTreeMap<InterruptionParadigm, usize> {
    let mut counts = BTreeMap::new();
    for p in participants {
        *counts.entry(p.paradigm()).or_insert(0) += 1;
    }
    counts
}

/// Build the plan for `config` and write all config files.
pub fn generate_study(config: &GeneratorConfig) -> Result<StudyPlan> {
    let mut randomizer = TrafficRandomizer::new(config.seed);
    let plan = StudyPlan::build(&mut randomizer)?;

    info!(
        participants = plan.len(),
        seed = ?config.seed,
        config_dir = %config.config_dir.display(),
        "Writing participant configs"
    );

    let paths = plan.write_all(&config.config_dir)?;

    info!(files = paths.len(), "Study generation complete");
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assignment::TaskSetting;

    fn seeded_plan(seed: u64) -> StudyPlan {
        StudyPlan::build(&mut TrafficRandomizer::new(Some(seed))).unwrap()
    }

    #[test]
    fn test_eighteen_participants_numbered_in_order() {
        let plan = seeded_plan(1);
        assert_eq!(plan.len(), 18);
        let ids: Vec<String> = plan.participants().iter().map(|p| p.id().to_string()).collect();
        let expected: Vec<String> = (1..=18).map(|i| format!("P{:02}", i)).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn test_paradigms_cycle_in_fixed_order() {
        let plan = seeded_plan(2);
        for (i, p) in plan.participants().iter().enumerate() {
            assert_eq!(p.paradigm(), InterruptionParadigm::ALL[i % 3]);
        }
        for count in plan.paradigm_counts().values() {
            assert_eq!(*count, 6);
        }
    }

    #[test]
    fn test_task_orders_follow_design() {
        let plan = seeded_plan(3);
        let orders = study_task_orders();
        for (i, p) in plan.participants().iter().enumerate() {
            assert_eq!(p.task_order(), orders[i / 3].as_slice());
        }
        assert_eq!(
            plan.participants()[0].task_order(),
            &[TaskSetting::One, TaskSetting::Two, TaskSetting::Three]
        );
    }

    #[test]
    fn test_task_and_paradigm_stable_without_seed() {
        let a = StudyPlan::build(&mut TrafficRandomizer::new(None)).unwrap();
        let b = StudyPlan::build(&mut TrafficRandomizer::new(None)).unwrap();
        for (x, y) in a.participants().iter().zip(b.participants()) {
            assert_eq!(x.id(), y.id());
            assert_eq!(x.paradigm(), y.paradigm());
            assert_eq!(x.task_order(), y.task_order());
        }
    }

    #[test]
    fn test_same_seed_same_plan() {
        assert_eq!(seeded_plan(42), seeded_plan(42));
    }

    #[test]
    fn test_each_task_once_per_block_position_per_paradigm() {
        let plan = seeded_plan(4);
        for paradigm in InterruptionParadigm::ALL {
            for position in 0..3 {
                let mut counts = BTreeMap::new();
                for p in plan.participants().iter().filter(|p| p.paradigm() == paradigm) {
                    *counts.entry(p.task_order()[position]).or_insert(0) += 1;
                }
                assert_eq!(counts.len(), 3);
                assert!(counts.values().all(|&c| c == 2));
            }
        }
    }

    #[test]
    fn test_display_lists_every_participant() {
        let rendered = seeded_plan(5).to_string();
        assert!(rendered.starts_with("Study plan (18 participants)"));
        assert!(rendered.contains("P01 SelfRegulated"));
        assert!(rendered.contains("P18 SystemInitiated"));
    }
}
