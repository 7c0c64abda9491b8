pub mod metadata;
pub mod resolve;
pub mod validate;
