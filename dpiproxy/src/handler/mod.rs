pub mod http;
pub mod https;
