pub mod archive_handler;
pub mod key_handlers;
