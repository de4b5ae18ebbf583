//! Input kind detection

use std::path::Path;

use crate::hcl::TERRAFORM_EXTENSION;

/// Detect whether a path holds a state snapshot or configuration.
pub fn detect_input(path: &Path) -> Option<InputKind> {
    if path.is_dir() {
        return Some(InputKind::Hcl);
    }
    let name = path.file_name()?.to_str()?;
    let extension = path.extension().and_then(|e| e.to_str());
    match extension {
        Some(TERRAFORM_EXTENSION) => Some(InputKind::Hcl),
        Some("tfstate") | Some("json") => Some(InputKind::State),
        _ if name.ends_with(".tfstate.backup") => Some(InputKind::State),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// A `terraform.tfstate` document.
    State,
    /// A configuration directory or `.tf` file.
    Hcl,
}
