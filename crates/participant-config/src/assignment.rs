//! Study vocabulary and the per-participant assignment.
//!
//! The three vocabularies (task settings, traffic levels, interruption
//! paradigms) are fixed by the study protocol. Their string labels are the
//! exact values the simulator expects in the generated config files.

use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// N-back setting shown to the participant during a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TaskSetting {
    One,
    Two,
    Three,
}

impl TaskSetting {
    /// All settings, indexed the way Latin-square symbols are.
    pub const ALL: [TaskSetting; 3] = [TaskSetting::One, TaskSetting::Two, TaskSetting::Three];

    /// Map a Latin-square symbol to its task setting.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Display name written to `TaskSetting=`.
    pub fn label(self) -> &'static str {
        match self {
            TaskSetting::One => "One",
            TaskSetting::Two => "Two",
            TaskSetting::Three => "Three",
        }
    }
}

impl fmt::Display for TaskSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TaskSetting {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match Self::ALL.iter().find(|t| t.label() == s) {
            Some(task) => Ok(*task),
            None => bail!("Unknown task setting: {}", s),
        }
    }
}

/// Simulated traffic complexity for a single trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TrafficLevel {
    #[serde(rename = "1RV")]
    OneVehicle,
    #[serde(rename = "3RV")]
    ThreeVehicles,
    #[serde(rename = "5RV")]
    FiveVehicles,
}

impl TrafficLevel {
    pub const ALL: [TrafficLevel; 3] = [
        TrafficLevel::OneVehicle,
        TrafficLevel::ThreeVehicles,
        TrafficLevel::FiveVehicles,
    ];

    pub fn label(self) -> &'static str {
        match self {
            TrafficLevel::OneVehicle => "1RV",
            TrafficLevel::ThreeVehicles => "3RV",
            TrafficLevel::FiveVehicles => "5RV",
        }
    }
}

impl fmt::Display for TrafficLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TrafficLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match Self::ALL.iter().find(|t| t.label() == s) {
            Some(level) => Ok(*level),
            None => bail!("Unknown traffic level: {}", s),
        }
    }
}

/// Policy deciding how the secondary task gets interrupted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum InterruptionParadigm {
    SelfRegulated,
    SystemRecommended,
    SystemInitiated,
}

impl InterruptionParadigm {
    /// Paradigms in the order they are handed out to consecutive participants.
    pub const ALL: [InterruptionParadigm; 3] = [
        InterruptionParadigm::SelfRegulated,
        InterruptionParadigm::SystemRecommended,
        InterruptionParadigm::SystemInitiated,
    ];

    pub fn label(self) -> &'static str {
        match self {
            InterruptionParadigm::SelfRegulated => "SelfRegulated",
            InterruptionParadigm::SystemRecommended => "SystemRecommended",
            InterruptionParadigm::SystemInitiated => "SystemInitiated",
        }
    }
}

impl fmt::Display for InterruptionParadigm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for InterruptionParadigm {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match Self::ALL.iter().find(|p| p.label() == s) {
            Some(paradigm) => Ok(*paradigm),
            None => bail!("Unknown interruption paradigm: {}", s),
        }
    }
}

/// Sequential participant number, rendered as `P01`, `P02`, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ParticipantId(u32);

impl ParticipantId {
    pub fn new(number: u32) -> Self {
        Self(number)
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{:02}", self.0)
    }
}

impl FromStr for ParticipantId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let digits = match s.strip_prefix('P') {
            Some(d) if d.len() >= 2 && d.chars().all(|c| c.is_ascii_digit()) => d,
            _ => bail!("Invalid participant ID: {}", s),
        };
        let number = digits
            .parse()
            .map_err(|_| anyhow::anyhow!("Participant number out of range: {}", s))?;
        Ok(Self(number))
    }
}

impl From<ParticipantId> for String {
    fn from(id: ParticipantId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for ParticipantId {
    type Error = anyhow::Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

/// One participant's counterbalanced assignment.
///
/// Block `b` runs `task_order[b]`; its trials run the traffic levels of
/// `traffic_order[b]` in sequence. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantAssignment {
    id: ParticipantId,
    paradigm: InterruptionParadigm,
    task_order: Vec<TaskSetting>,
    traffic_order: Vec<Vec<TrafficLevel>>,
}

impl ParticipantAssignment {
    /// Build an assignment, rejecting orders that break counterbalancing.
    ///
    /// Every task setting must appear in `task_order` once, and each traffic
    /// sequence must be a permutation of all traffic levels.
    pub fn new(
        id: ParticipantId,
        paradigm: InterruptionParadigm,
        task_order: Vec<TaskSetting>,
        traffic_order: Vec<Vec<TrafficLevel>>,
    ) -> Result<Self> {
        if !is_permutation(&task_order, &TaskSetting::ALL) {
            bail!("{}: task order {:?} is not a permutation of all tasks", id, task_order);
        }
        if traffic_order.len() != task_order.len() {
            bail!(
                "{}: {} traffic sequences for {} blocks",
                id,
                traffic_order.len(),
                task_order.len()
            );
        }
        for (block, levels) in traffic_order.iter().enumerate() {
            if !is_permutation(levels, &TrafficLevel::ALL) {
                bail!(
                    "{}: block {} traffic {:?} is not a permutation of all levels",
                    id,
                    block + 1,
                    levels
                );
            }
        }

        Ok(Self {
            id,
            paradigm,
            task_order,
            traffic_order,
        })
    }

    pub fn id(&self) -> ParticipantId {
        self.id
    }

    pub fn paradigm(&self) -> InterruptionParadigm {
        self.paradigm
    }

    pub fn task_order(&self) -> &[TaskSetting] {
        &self.task_order
    }

    pub fn traffic_order(&self) -> &[Vec<TrafficLevel>] {
        &self.traffic_order
    }

    /// Iterate `(block_number, task, trial traffic)` with 1-based block numbers.
    pub fn blocks(&self) -> impl Iterator<Item = (usize, TaskSetting, &[TrafficLevel])> + '_ {
        self.task_order
            .iter()
            .zip(&self.traffic_order)
            .enumerate()
            .map(|(i, (task, levels))| (i + 1, *task, levels.as_slice()))
    }
}

fn is_permutation<T: PartialEq>(values: &[T], vocabulary: &[T]) -> bool {
    values.len() == vocabulary.len()
        && vocabulary
            .iter()
            .all(|v| values.iter().filter(|x| *x == v).count() == 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_traffic() -> Vec<Vec<TrafficLevel>> {
        vec![TrafficLevel::ALL.to_vec(); 3]
    }

    #[test]
    fn test_participant_id_zero_padded() {
        assert_eq!(ParticipantId::new(1).to_string(), "P01");
        assert_eq!(ParticipantId::new(18).to_string(), "P18");
        assert_eq!(ParticipantId::new(123).to_string(), "P123");
    }

    #[test]
    fn test_participant_id_parse() {
        assert_eq!("P07".parse::<ParticipantId>().unwrap(), ParticipantId::new(7));
        assert!("7".parse::<ParticipantId>().is_err());
        assert!("P7".parse::<ParticipantId>().is_err());
        assert!("Pxx".parse::<ParticipantId>().is_err());
    }

    #[test]
    fn test_labels_round_trip_through_from_str() {
        for task in TaskSetting::ALL {
            assert_eq!(task.label().parse::<TaskSetting>().unwrap(), task);
        }
        for level in TrafficLevel::ALL {
            assert_eq!(level.label().parse::<TrafficLevel>().unwrap(), level);
        }
        for paradigm in InterruptionParadigm::ALL {
            assert_eq!(paradigm.label().parse::<InterruptionParadigm>().unwrap(), paradigm);
        }
        assert!("Four".parse::<TaskSetting>().is_err());
        assert!("2RV".parse::<TrafficLevel>().is_err());
    }

    #[test]
    fn test_task_setting_from_index() {
        assert_eq!(TaskSetting::from_index(0), Some(TaskSetting::One));
        assert_eq!(TaskSetting::from_index(2), Some(TaskSetting::Three));
        assert_eq!(TaskSetting::from_index(3), None);
    }

    #[test]
    fn test_assignment_rejects_duplicate_task() {
        let result = ParticipantAssignment::new(
            ParticipantId::new(1),
            InterruptionParadigm::SelfRegulated,
            vec![TaskSetting::One, TaskSetting::One, TaskSetting::Three],
            all_traffic(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_assignment_rejects_repeated_traffic_level() {
        let mut traffic = all_traffic();
        traffic[1] = vec![
            TrafficLevel::OneVehicle,
            TrafficLevel::OneVehicle,
            TrafficLevel::FiveVehicles,
        ];
        let result = ParticipantAssignment::new(
            ParticipantId::new(1),
            InterruptionParadigm::SelfRegulated,
            TaskSetting::ALL.to_vec(),
            traffic,
        );
        let err = result.unwrap_err().to_string();
        assert!(err.contains("block 2"), "unexpected error: {}", err);
    }

    #[test]
    fn test_assignment_rejects_missing_traffic_block() {
        let result = ParticipantAssignment::new(
            ParticipantId::new(1),
            InterruptionParadigm::SystemInitiated,
            TaskSetting::ALL.to_vec(),
            vec![TrafficLevel::ALL.to_vec(); 2],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_blocks_are_one_based() {
        let assignment = ParticipantAssignment::new(
            ParticipantId::new(2),
            InterruptionParadigm::SystemRecommended,
            vec![TaskSetting::Three, TaskSetting::One, TaskSetting::Two],
            all_traffic(),
        )
        .unwrap();

        let blocks: Vec<_> = assignment.blocks().map(|(b, task, _)| (b, task)).collect();
        assert_eq!(
            blocks,
            vec![
                (1, TaskSetting::Three),
                (2, TaskSetting::One),
                (3, TaskSetting::Two)
            ]
        );
    }

    #[test]
    fn test_assignment_serializes_with_labels() {
        let assignment = ParticipantAssignment::new(
            ParticipantId::new(5),
            InterruptionParadigm::SystemInitiated,
            TaskSetting::ALL.to_vec(),
            all_traffic(),
        )
        .unwrap();

        let json = serde_json::to_string(&assignment).unwrap();
        assert!(json.contains("\"P05\""));
        assert!(json.contains("\"5RV\""));
        assert!(json.contains("\"SystemInitiated\""));

        let back: ParticipantAssignment = serde_json::from_str(&json).unwrap();
        assert_eq!(back, assignment);
    }
}
