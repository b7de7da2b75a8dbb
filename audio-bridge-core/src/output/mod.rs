pub mod null_device;
pub mod wav_device;
