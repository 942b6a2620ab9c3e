//! Entity schemas: stage descriptors, per-entity stage lists and the
//! reference data they consult.

mod entity;
mod reference;
mod stage;

pub use entity::{EntityKind, EntitySchema};
pub use reference::{FlagLabels, ReferenceData};
pub use stage::{IssueKind, ParseTarget, Stage};
