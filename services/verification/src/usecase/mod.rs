pub mod code;
pub mod step_up;
