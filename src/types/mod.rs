pub mod id;
pub mod amount;

pub use amount::Amount;
pub use id::{Address, Position};
