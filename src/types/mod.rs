pub mod amount;
pub mod ids;

pub use amount::Amount;
pub use ids::{ExpenseId, GroupId, ParticipantId};
