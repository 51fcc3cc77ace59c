pub mod pipe;

pub use pipe::spawn_pipe_pair;
