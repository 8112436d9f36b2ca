pub mod directory;
pub mod health;
pub mod whoami;
