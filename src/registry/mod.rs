// Registry module - the fixed owner committee

mod owners;

pub use owners::OwnerRegistry;
