//! Participant configuration generator for NDRT interruption studies.
//!
//! This crate produces one INI config per participant that:
//! - Counterbalances task order with a cyclic Latin square and its transpose
//! - Crosses every task order with each interruption paradigm
//! - Shuffles traffic complexity independently within each block

pub mod assignment;
pub mod config;
pub mod design;
pub mod manifest;
pub mod plan;
pub mod randomizer;
pub mod reader;
pub mod writer;

pub use assignment::{
    InterruptionParadigm, ParticipantAssignment, ParticipantId, TaskSetting, TrafficLevel,
};
pub use config::GeneratorConfig;
pub use design::LatinSquare;
pub use plan::{generate_study, StudyPlan};
pub use randomizer::TrafficRandomizer;
