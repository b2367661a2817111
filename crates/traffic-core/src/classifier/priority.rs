use crate::models::PriorityState;

pub const DETECTED: &str = "detected";
pub const NOT_DETECTED: &str = "not-detected";

/// Display label for the priority detection flag
pub fn priority_label(state: &PriorityState) -> &'static str {
    if state.detected {
        DETECTED
    } else {
        NOT_DETECTED
    }
}
