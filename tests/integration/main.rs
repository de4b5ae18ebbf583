//! Integration tests for Infragraph
//!
//! These tests drive the whole pipeline from files on disk, through the
//! library crates and through the CLI binary.

use infragraph_core::{EdgeView, Options};
use infragraph_generate::{from_hcl_path, from_state};
use infragraph_providers::ProviderRegistry;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

const STATE: &str = r#"{
  "version": 4,
  "terraform_version": "1.5.7",
  "resources": [
    {
      "mode": "managed",
      "type": "aws_lb",
      "name": "front",
      "instances": [{"attributes": {"id": "lb-1", "security_groups": ["sg-lb"]}}]
    },
    {
      "mode": "managed",
      "type": "aws_instance",
      "name": "app",
      "instances": [
        {"index_key": 0, "attributes": {"id": "i-0", "vpc_security_group_ids": ["sg-app"]}},
        {"index_key": 1, "attributes": {"id": "i-1", "vpc_security_group_ids": ["sg-app"]}}
      ]
    },
    {
      "mode": "managed",
      "type": "aws_security_group",
      "name": "lb",
      "instances": [{"attributes": {
        "id": "sg-lb",
        "ingress": [{"from_port": 443, "to_port": 443, "protocol": "tcp", "cidr_blocks": ["0.0.0.0/0"]}]
      }}]
    },
    {
      "mode": "managed",
      "type": "aws_security_group",
      "name": "app",
      "instances": [{"attributes": {
        "id": "sg-app",
        "ingress": [{"from_port": 8080, "to_port": 8080, "protocol": "tcp", "security_groups": ["sg-lb"]}]
      }}]
    },
    {
      "mode": "data",
      "type": "aws_ami",
      "name": "ubuntu",
      "instances": [{"attributes": {"id": "ami-1"}}]
    }
  ]
}"#;

const MAIN_TF: &str = r#"
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

module "storage" {
  source = "./storage"
}
"#;

const STORAGE_TF: &str = r#"
resource "aws_s3_bucket" "medias" {
  bucket = "medias"
}
"#;

fn workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("terraform.tfstate"), STATE).unwrap();
    let config = dir.path().join("config");
    std::fs::create_dir_all(config.join("storage")).unwrap();
    std::fs::write(config.join("main.tf"), MAIN_TF).unwrap();
    std::fs::write(config.join("storage/main.tf"), STORAGE_TF).unwrap();
    dir
}

fn infragraph(args: &[&str], cwd: &Path) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_infragraph"))
        .args(args)
        .current_dir(cwd)
        .output()
        .expect("failed to run infragraph")
}

#[test]
fn test_state_file_pipeline() {
    let dir = workspace();
    let raw = std::fs::read(dir.path().join("terraform.tfstate")).unwrap();
    let (graph, config) = from_state(&raw, &ProviderRegistry::builtin(), Options::full()).unwrap();

    assert_eq!(
        graph.canonicals(),
        vec![
            "aws_lb.front",
            "aws_instance.app[0]",
            "aws_instance.app[1]",
            "im_out.tcp/443->443",
        ]
    );
    assert_eq!(
        graph.edge_views(),
        vec![
            EdgeView::new(
                "aws_lb.front",
                "aws_instance.app[0]",
                &["aws_security_group.lb", "aws_security_group.app"],
            ),
            EdgeView::new(
                "aws_lb.front",
                "aws_instance.app[1]",
                &["aws_security_group.lb", "aws_security_group.app"],
            ),
            EdgeView::new("im_out.tcp/443->443", "aws_lb.front", &[]),
        ]
    );
    assert_eq!(config.len(), 5);
    assert!(config.get("data.aws_ami.ubuntu").is_none());
}

#[test]
fn test_configuration_directory_pipeline() {
    let dir = workspace();
    let graph = from_hcl_path(
        &dir.path().join("config"),
        &ProviderRegistry::builtin(),
        Options::full(),
    )
    .unwrap();

    assert_eq!(
        graph.canonicals(),
        vec![
            "aws_instance.bastion",
            "module.storage.aws_s3_bucket.medias",
            "im_out.tcp/22->22",
        ]
    );
    assert_eq!(
        graph.edge_views(),
        vec![EdgeView::new("im_out.tcp/22->22", "aws_instance.bastion", &[])]
    );
}

#[test]
fn test_cli_generate_state() {
    let dir = workspace();
    let output = infragraph(&["generate", "terraform.tfstate"], dir.path());
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["nodes"].as_array().unwrap().len(), 4);
    assert_eq!(json["edges"].as_array().unwrap().len(), 3);
    assert_eq!(json["edges"][0]["source"], "aws_lb.front");
    assert_eq!(json["edges"][0]["canonicals"][0], "aws_security_group.lb");
}

#[test]
fn test_cli_flags_and_config_file() {
    let dir = workspace();
    std::fs::write(dir.path().join("infragraph.toml"), "external_nodes = false\n").unwrap();

    let output = infragraph(
        &["generate", "config", "--config", "infragraph.toml", "--raw"],
        dir.path(),
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let nodes: Vec<&str> = json["nodes"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|n| n["canonical"].as_str())
        .collect();
    assert_eq!(
        nodes,
        vec![
            "aws_instance.bastion",
            "aws_security_group.bastion",
            "module.storage.aws_s3_bucket.medias",
        ]
    );
    assert_eq!(json["edges"].as_array().unwrap().len(), 2);
}

#[test]
fn test_cli_rejects_bad_state() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("old.tfstate"), r#"{"version": 1}"#).unwrap();

    let output = infragraph(&["generate", "old.tfstate"], dir.path());
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("old.tfstate"), "{}", stderr);
}

#[test]
fn test_cli_lists_providers() {
    let dir = TempDir::new().unwrap();
    let output = infragraph(&["providers"], dir.path());
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    for namespace in ["aws_", "azurerm_", "flexibleengine_", "google_", "openstack_", "scaleway_"] {
        assert!(stdout.contains(namespace), "missing {}", namespace);
    }
}
