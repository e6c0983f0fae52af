pub mod config;
pub mod debounce;
pub mod http;
pub mod list_state;
pub mod pagination;
pub mod source;
