// Adapters layer: concrete implementations for external systems (database, structure depiction).

pub mod sqlite;
pub mod structure;

pub use sqlite::{DatabaseCopy, SqliteSource};
pub use structure::{DisabledRenderer, OpenBabelRenderer};
