pub mod archive;
pub mod keys;
