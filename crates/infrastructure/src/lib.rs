pub mod clock;
pub mod dynamodb;
pub mod memory;
pub mod models;
pub mod store;

pub use clock::*;
pub use dynamodb::*;
pub use memory::*;
pub use models::*;
pub use store::*;
