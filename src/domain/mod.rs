pub mod gateway;
pub mod purchase;
pub mod record;

pub use gateway::*;
pub use purchase::*;
pub use record::*;
