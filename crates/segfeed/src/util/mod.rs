pub mod http;
pub mod path;
