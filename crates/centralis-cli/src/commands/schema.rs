//! Schema command - print the cleaning stages of an entity kind.

use centralis::{EntityKind, EntitySchema, ReferenceData};

use super::CommandResult;

pub fn run(kind: EntityKind) -> CommandResult {
    let schema = EntitySchema::for_kind(kind, &ReferenceData::default());
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
