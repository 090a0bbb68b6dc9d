pub mod chunk_buffer;
pub mod level_meter;
pub mod pcm;
