pub mod image_io;
pub mod seq;
pub mod seq_writer;
