pub mod audio_context;
pub mod media_devices;
pub mod permissions;
pub mod recorder;
pub mod session_observer;
