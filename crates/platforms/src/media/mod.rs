pub mod representation;

pub use representation::{Representation, ResolvedStreams, StreamKind, select_highest};
