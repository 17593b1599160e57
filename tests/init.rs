use std::process::Command;

#[test]
fn init_creates_valid_toml() {
    let dir = tempfile::tempdir().unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_heimdall"))
        .arg("init")
        .current_dir(dir.path())
        .output()
        .unwrap();

    assert!(
        output.status.success(),
        "heimdall init failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let config_path = dir.path().join("heimdall.toml");
    assert!(config_path.exists(), "heimdall.toml should exist");

    let content = std::fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("[server]"));
    assert!(content.contains("[ai.anthropic]"));

    // Verify it's valid TOML that heimdall-core can parse.
    let config: heimdall_core::HeimdallConfig = toml::from_str(&content).unwrap();
    assert_eq!(config.ai.default_provider, "anthropic");
}

#[test]
fn init_refuses_if_exists() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("heimdall.toml"), "# existing").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_heimdall"))
        .arg("init")
        .current_dir(dir.path())
        .output()
        .unwrap();

    assert!(!output.status.success());
}
