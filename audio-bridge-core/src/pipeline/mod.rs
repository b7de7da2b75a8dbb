pub mod consumer;
pub mod frame_block;
pub mod gate;
pub mod overrun;
pub mod producer;
pub mod shared;
