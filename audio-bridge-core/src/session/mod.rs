pub mod pipeline;
pub mod termination;
