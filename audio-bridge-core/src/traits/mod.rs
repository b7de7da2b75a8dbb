pub mod frame_source;
pub mod output_device;
pub mod session_delegate;
