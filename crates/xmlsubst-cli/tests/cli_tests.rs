//! Integration tests for the xmlsubst binary

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

type TestResult = Result<(), Box<dyn std::error::Error>>;

const WEB_CONFIG: &str = r#"<configuration xmlns:xdt="http://schemas.microsoft.com/XML-Document-Transform">
  <appSettings>
    <add key="conntype" value="conntype" />
  </appSettings>
  <connectionStrings>
    <add name="DefaultConnection" connectionString="MyDB" xdt:Transform="Replace" />
  </connectionStrings>
  <system.web>
    <customErrors mode="conntype" />
  </system.web>
</configuration>
"#;

fn xmlsubst() -> Command {
    let mut cmd = Command::cargo_bin("xmlsubst").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

fn config_in(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_cli_help() {
    xmlsubst()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("--vars-file"))
        .stdout(predicate::str::contains("--values-only"));
}

#[test]
fn test_requires_a_file() {
    xmlsubst().arg("-D").arg("a=b").assert().failure();
}

#[test]
fn test_substitutes_with_var_flags() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = config_in(&dir, "Web.config", WEB_CONFIG);

    xmlsubst()
        .args(["-D", "conntype=new_connType_value", "-D", "MyDB=Server=prod"])
        .arg(&path)
        .assert()
        .success();

    let output = fs::read_to_string(&path)?;
    assert!(output.contains(r#"<add key="new_connType_value" value="new_connType_value" />"#));
    assert!(output.contains(r#"connectionString="Server=prod""#));
    assert!(output.contains(r#"<customErrors mode="conntype" />"#));
    Ok(())
}

#[test]
fn test_vars_file_and_custom_tag() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = config_in(&dir, "Web.config", WEB_CONFIG);
    let vars = config_in(&dir, "vars.json", r#"{"conntype": "fromFile"}"#);

    xmlsubst()
        .arg("--vars-file")
        .arg(&vars)
        .args(["--tag", "system.web"])
        .arg(&path)
        .assert()
        .success();

    let output = fs::read_to_string(&path)?;
    assert!(output.contains(r#"<add key="conntype" value="conntype" />"#));
    assert!(output.contains(r#"<customErrors mode="fromFile" />"#));
    Ok(())
}

#[test]
fn test_env_prefix_and_values_only() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = config_in(&dir, "Web.config", WEB_CONFIG);

    xmlsubst()
        .env("XMLSUBST_TEST_xdt:Transform", "DelAttributes")
        .env("XMLSUBST_TEST_DefaultConnection", "connectionStringValue1")
        .args(["--env-prefix", "XMLSUBST_TEST_", "--values-only"])
        .arg(&path)
        .assert()
        .success();

    let output = fs::read_to_string(&path)?;
    assert!(output.contains(
        r#"<add name="connectionStringValue1" connectionString="MyDB" xdt:Transform="Replace" />"#
    ));
    Ok(())
}

#[test]
fn test_failure_on_one_file_does_not_stop_others() -> TestResult {
    let dir = tempfile::tempdir()?;
    let missing = dir.path().join("Missing.config");
    let broken = config_in(&dir, "Broken.config", "<configuration><appSettings>");
    let good = config_in(&dir, "Web.config", WEB_CONFIG);

    xmlsubst()
        .args(["-D", "conntype=updated"])
        .arg(&missing)
        .arg(&broken)
        .arg(&good)
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"))
        .stderr(predicate::str::contains("malformed xml"))
        .stderr(predicate::str::contains("2 of 3 file(s) failed"));

    assert!(fs::read_to_string(&good)?.contains(r#"value="updated""#));
    assert_eq!(fs::read_to_string(&broken)?, "<configuration><appSettings>");
    Ok(())
}

#[test]
fn test_rejects_bad_assignment() {
    xmlsubst()
        .args(["-D", "missing-equals", "Web.config"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected KEY=VALUE"));
}

#[test]
fn test_no_variables_fails() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = config_in(&dir, "Web.config", WEB_CONFIG);

    xmlsubst()
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no variables given"));

    assert_eq!(fs::read_to_string(&path)?, WEB_CONFIG);
    Ok(())
}
