use std::fs;
use std::process::Command;

use tempfile::TempDir;

#[test]
fn list_prints_builtin_catalog() {
    let output = Command::new(env!("CARGO_BIN_EXE_shader-gallery"))
        .arg("--list")
        .output()
        .expect("failed to run shader-gallery --list");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("plasma"));
    assert!(stdout.contains("ripple"));
    assert!(stdout.contains("fbm"));
    assert!(stdout.contains("u_speed"));
}

#[test]
fn list_uses_manifest_when_supplied() {
    let root = TempDir::new().unwrap();
    let shader_path = root.path().join("solid.frag");
    fs::write(
        &shader_path,
        "uniform float u_tint;\nvoid mainImage(out vec4 fragColor, in vec2 fragCoord) {\n    fragColor = vec4(u_tint, 0.0, 0.0, 1.0);\n}\n",
    )
    .unwrap();

    let manifest_path = root.path().join("gallery.toml");
    fs::write(
        &manifest_path,
        r#"
name = "Test Gallery"

[[shader]]
id = "solid"
name = "Solid"
source = "solid.frag"

[[shader.parameter]]
name = "u_tint"
label = "Tint"
min = 0.0
max = 1.0
step = 0.05
default = 0.5
"#,
    )
    .unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_shader-gallery"))
        .args(["--list", "--manifest"])
        .arg(&manifest_path)
        .output()
        .expect("failed to run shader-gallery with manifest");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("solid"));
    assert!(stdout.contains("u_tint"));
    assert!(!stdout.contains("plasma"));
}

#[test]
fn unknown_manifest_path_fails() {
    let output = Command::new(env!("CARGO_BIN_EXE_shader-gallery"))
        .args(["--list", "--manifest", "/nonexistent/gallery.toml"])
        .output()
        .expect("failed to run shader-gallery");

    assert!(!output.status.success());
}
