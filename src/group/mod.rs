pub mod record;
pub mod state;

pub use record::GroupRecord;
pub use state::GroupState;
