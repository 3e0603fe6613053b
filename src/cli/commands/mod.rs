pub mod hash;
pub mod ping;
pub mod token;
