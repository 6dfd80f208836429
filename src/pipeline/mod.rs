pub mod context;
pub mod debounce;
pub mod submit;
pub mod transport;
