//! Record table: the in-memory batch every source produces and every pipeline consumes.

mod record;
mod value;

pub use record::RecordTable;
pub use value::{Value, is_null_marker};
