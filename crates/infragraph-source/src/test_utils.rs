//! Test utilities for infragraph sources

use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Write `files` (relative path, content) under a fresh temporary directory.
pub fn write_tree(files: &[(&str, &str)]) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    for (relative, content) in files {
        write_file(temp_dir.path(), relative, content);
    }
    temp_dir
}

fn write_file(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// A root module calling a `network` module which itself calls `firewall`.
pub fn create_nested_modules() -> TempDir {
    write_tree(&[
        (
            "main.tf",
            r#"
resource "aws_instance" "bastion" {
  vpc_security_group_ids = [aws_security_group.bastion.id]
}

resource "aws_security_group" "bastion" {
  ingress {
    from_port   = 22
    to_port     = 22
    protocol    = "tcp"
    cidr_blocks = ["0.0.0.0/0"]
  }
}

module "network" {
  source = "./modules/network"
}

module "registry" {
  source  = "terraform-aws-modules/vpc/aws"
  version = "5.0.0"
}
"#,
        ),
        (
            "modules/network/main.tf",
            r#"
resource "aws_nat_gateway" "gw" {
  subnet_id = "subnet-1"
}

module "firewall" {
  source = "../firewall"
}
"#,
        ),
        (
            "modules/firewall/rules.tf",
            r#"
resource "aws_security_group" "edge" {
  name = "edge"
}
"#,
        ),
        ("modules/firewall/README.md", "not configuration"),
    ])
}
