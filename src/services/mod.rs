pub mod directory;
pub mod identity;
