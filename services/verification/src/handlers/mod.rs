pub mod code;
pub mod eligibility;
pub mod step_up;
