//! Resource sources: Terraform state snapshots and HCL module trees

pub mod detect;
pub mod hcl;
pub mod state;


#[cfg(test)]
pub mod test_utils;

pub use detect::{InputKind, detect_input};
pub use crate::hcl::ModuleTree;
pub use state::{StateSnapshot, expand_flatmap, parse_module_address, parse_state, parse_state_with};
