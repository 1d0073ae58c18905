//! End-to-end tests for the signguard binary

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const COMPLETE: &str = "keyAlias=a\nkeyPassword=b\nstoreFile=/k.jks\nstorePassword=d\n";

const ENV_VARS: [&str; 4] = [
    "ANDROID_KEY_ALIAS",
    "ANDROID_KEY_PASSWORD",
    "ANDROID_STORE_FILE",
    "ANDROID_STORE_PASSWORD",
];

fn signguard(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("signguard").unwrap();
    cmd.current_dir(dir)
        .env_remove("SIGNGUARD_PROJECT_DIR")
        .env_remove("RUST_LOG")
        .arg("--no-color");
    for var in ENV_VARS {
        cmd.env_remove(var);
    }
    cmd
}

fn project(credentials: Option<&str>) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("app")).unwrap();
    if let Some(text) = credentials {
        fs::write(dir.path().join("app/key.properties"), text).unwrap();
    }
    dir
}

#[test]
fn release_without_credentials_fails_with_banner() {
    let dir = project(None);
    let dir_name = dir.path().file_name().unwrap().to_string_lossy().to_string();

    signguard(dir.path())
        .args(["check", "assembleRelease"])
        .assert()
        .code(5)
        .stderr(predicate::str::contains("Release signing keystore not configured"))
        .stderr(predicate::str::contains("Expected file: /"))
        .stderr(predicate::str::contains(format!("{dir_name}/app/key.properties")))
        .stderr(predicate::str::contains("scripts/generate-keystore.ps1"))
        .stderr(predicate::str::contains("GitHub Secrets"));
}

#[test]
fn debug_without_credentials_proceeds() {
    let dir = project(None);
    signguard(dir.path())
        .args(["check", "assembleDebug"])
        .assert()
        .success()
        .stdout(predicate::str::contains("release signing not required"));
}

#[test]
fn release_with_credentials_passes() {
    let dir = project(Some(COMPLETE));
    signguard(dir.path())
        .args(["check", "bundleRelease"])
        .assert()
        .success()
        .stdout(predicate::str::contains("bundleRelease (key 'a')"));
}

#[test]
fn check_json_redacts_passwords() {
    let dir = project(Some(COMPLETE));
    let output = signguard(dir.path())
        .args(["check", "--json", "assembleRelease"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["intent"]["kind"], "release");
    assert_eq!(report["signing"]["key_alias"], "a");
    assert_eq!(report["signing"]["store_file"], "/k.jks");
    assert_eq!(report["signing"]["key_password"], "********");
    let text = String::from_utf8_lossy(&output.stdout);
    assert!(!text.contains("\"b\""));
    assert!(!text.contains("\"d\""));
}

#[test]
fn check_json_reports_missing_credentials() {
    let dir = project(None);
    let output = signguard(dir.path())
        .args(["check", "--json", "bundleRelease"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(5));
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["code_str"], "E7001");
}

#[test]
fn incomplete_credentials_are_a_configuration_error() {
    let dir = project(Some("keyAlias=a\nkeyPassword=b\nstorePassword=d\n"));
    signguard(dir.path())
        .args(["check", "assembleRelease"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("storeFile is missing"));
}

#[test]
fn strict_check_requires_keystore() {
    let dir = project(Some(
        "keyAlias=a\nkeyPassword=b\nstoreFile=upload.jks\nstorePassword=d\n",
    ));
    signguard(dir.path())
        .args(["check", "--strict", "assembleRelease"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("keystore not found"));

    fs::write(dir.path().join("app/upload.jks"), b"jks").unwrap();
    signguard(dir.path())
        .args(["check", "--strict", "assembleRelease"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Keystore found"));
}

#[test]
fn show_masks_passwords() {
    let dir = project(Some(COMPLETE));
    signguard(dir.path())
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("********"))
        .stdout(predicate::str::contains("/k.jks"))
        .stdout(predicate::str::contains("storePassword").and(predicate::str::contains("=d").not()));
}

#[test]
fn show_without_credentials_fails() {
    let dir = project(None);
    signguard(dir.path())
        .arg("show")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No signing credentials"));
}

#[test]
fn release_build_is_refused_before_gradle() {
    let dir = project(None);
    signguard(dir.path())
        .args(["build", "--configuration", "release", "--bundle"])
        .assert()
        .code(5)
        .stderr(predicate::str::contains("Requested: bundleRelease"));
}

#[test]
fn init_writes_credentials_from_environment() {
    let dir = project(None);
    signguard(dir.path())
        .arg("init")
        .env("ANDROID_KEY_ALIAS", "ci-key")
        .env("ANDROID_KEY_PASSWORD", "kp=1")
        .env("ANDROID_STORE_FILE", "/ci/upload.jks")
        .env("ANDROID_STORE_PASSWORD", "sp#2")
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote"));

    let written = fs::read_to_string(dir.path().join("app/key.properties")).unwrap();
    assert!(written.contains("keyAlias=ci-key"));

    signguard(dir.path())
        .args(["check", "assembleRelease"])
        .assert()
        .success()
        .stdout(predicate::str::contains("key 'ci-key'"));

    signguard(dir.path())
        .arg("init")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--force"));
}

#[test]
fn init_without_environment_fails() {
    let dir = project(None);
    signguard(dir.path())
        .arg("init")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("ANDROID_KEY_ALIAS"));
    assert!(!dir.path().join("app/key.properties").exists());
}

#[test]
fn config_file_sets_tasks_and_remediation() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join(".signguard.toml"),
        r#"
[project]
root = "android"

[signing]
release_tasks = [":app:bundleRelease"]

[remediation]
local_script = "tools/new-keystore.sh"
ci_reference = "Vault secret/android"
docs = "SIGNING.md"
"#,
    )
    .unwrap();

    signguard(dir.path())
        .args(["check", "bundleRelease"])
        .assert()
        .success();

    signguard(dir.path())
        .args(["check", ":app:bundleRelease"])
        .assert()
        .code(5)
        .stderr(predicate::str::contains("android/app/key.properties"))
        .stderr(predicate::str::contains("tools/new-keystore.sh"))
        .stderr(predicate::str::contains("Vault secret/android"))
        .stderr(predicate::str::contains("See SIGNING.md"));
}

#[test]
fn project_dir_flag_points_at_credentials() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("mobile/app")).unwrap();
    fs::write(dir.path().join("mobile/app/key.properties"), COMPLETE).unwrap();

    signguard(dir.path())
        .args(["--project-dir", "mobile", "check", "assembleRelease"])
        .assert()
        .success();
}

#[test]
fn invalid_config_exits_with_config_error() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join(".signguard.toml"),
        "[signing]\nrelease_tasks = []\n",
    )
    .unwrap();
    signguard(dir.path())
        .args(["check", "assembleRelease"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("signing.release_tasks"));
}

#[test]
fn doctor_reports_missing_credentials() {
    let dir = project(None);
    signguard(dir.path())
        .arg("doctor")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("release builds will be refused"));
}

#[test]
fn flags_after_task_names_are_honored() {
    let dir = project(Some(
        "keyAlias=a\nkeyPassword=b\nstoreFile=upload.jks\nstorePassword=d\n",
    ));
    signguard(dir.path())
        .args(["check", "assembleRelease", "--strict"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("keystore not found"));

    let output = signguard(dir.path())
        .args(["check", "assembleRelease", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["intent"]["tasks"][0], "assembleRelease");
}

#[test]
fn no_color_output_has_no_escape_codes() {
    let dir = project(Some(COMPLETE));
    signguard(dir.path())
        .args(["check", "assembleRelease"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\x1b").not());

    let dir = project(None);
    signguard(dir.path())
        .args(["check", "assembleRelease"])
        .assert()
        .code(5)
        .stderr(predicate::str::contains("\x1b").not());
}

#[test]
fn single_verbose_flag_enables_debug_logging() {
    let dir = project(None);
    signguard(dir.path())
        .args(["check", "assembleDebug"])
        .assert()
        .success()
        .stderr(predicate::str::contains("context resolved").not());

    signguard(dir.path())
        .args(["-v", "check", "assembleDebug"])
        .assert()
        .success()
        .stderr(predicate::str::contains("context resolved"));
}

#[cfg(unix)]
#[test]
fn init_creates_owner_only_file() {
    use std::os::unix::fs::PermissionsExt;

    let dir = project(None);
    signguard(dir.path())
        .arg("init")
        .env("ANDROID_KEY_ALIAS", "ci-key")
        .env("ANDROID_KEY_PASSWORD", "kp")
        .env("ANDROID_STORE_FILE", "/ci/upload.jks")
        .env("ANDROID_STORE_PASSWORD", "sp")
        .assert()
        .success();

    let mode = fs::metadata(dir.path().join("app/key.properties"))
        .unwrap()
        .permissions()
        .mode();
    assert_eq!(mode & 0o777, 0o600);
}
