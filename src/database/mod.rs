pub mod memory;
pub mod pool;
pub mod postgres;
pub mod store;

pub use memory::MemoryCandidateStore;
pub use postgres::PgCandidateStore;
pub use store::{CandidateFilter, CandidatePage, CandidateStore, InsertOutcome, TagInsert};
