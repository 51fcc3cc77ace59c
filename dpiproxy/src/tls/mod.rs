pub mod fragment;
pub mod record;

pub use fragment::{fragment_chunks, write_fragmented};
pub use record::TlsRecord;
