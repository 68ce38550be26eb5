//! CLI integration tests for the openapi-request-validator binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("openapi-request-validator"))
}

fn fixture(name: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
        .to_string_lossy()
        .into_owned()
}

fn write_temp_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

mod validate_command {
    use super::*;

    #[test]
    fn valid_request() {
        cmd()
            .args(["validate", "--spec", &fixture("petstore-v3.json")])
            .args(["--method", "GET", "--path", "/api/pets/7"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Valid"));
    }

    #[test]
    fn invalid_path_parameter() {
        cmd()
            .args(["validate", "--spec", &fixture("petstore-v3.json")])
            .args(["-X", "GET", "--path", "/api/pets/seven"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains(
                "The path parameter id does not have the correct type",
            ));
    }

    #[test]
    fn body_from_file_json_output() {
        let dir = TempDir::new().unwrap();
        let body = write_temp_file(&dir, "pet.json", r#"{"tag":"lizard","details":{"code":1}}"#);

        cmd()
            .args(["validate", "--spec", &fixture("petstore-v3.json")])
            .args(["--method", "POST", "--path", "/api/pets"])
            .args(["-H", "Content-Type: application/json"])
            .args(["--body", body.to_str().unwrap(), "--json"])
            .assert()
            .code(1)
            .stdout(predicate::str::contains(r#""valid":false"#))
            .stdout(predicate::str::contains("The field name is mandatory"))
            .stdout(predicate::str::contains(
                "The field tag does not have the correct enum value",
            ));
    }

    #[test]
    fn valid_json_output() {
        cmd()
            .args(["validate", "--spec", &fixture("petstore-v2.yaml")])
            .args(["--method", "GET", "--path", "/v2/pets?kind=cat", "--json"])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#"{"valid":true}"#));
    }

    #[test]
    fn missing_body() {
        cmd()
            .args(["validate", "--spec", &fixture("petstore-v2.yaml")])
            .args(["--method", "POST", "--path", "/v2/pets"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Request body is expected but not found"));
    }

    #[test]
    fn header_validation_and_skip() {
        cmd()
            .args(["validate", "--spec", &fixture("petstore-v3.json")])
            .args(["--method", "GET", "--path", "/api/pets", "-H", "X-Request-Id: nope"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("The header parameter X-Request-Id"));

        cmd()
            .args(["validate", "--spec", &fixture("petstore-v3.json")])
            .args(["--method", "GET", "--path", "/api/pets", "-H", "X-Request-Id: nope"])
            .arg("--skip-headers")
            .assert()
            .success();
    }

    #[test]
    fn method_not_supported() {
        cmd()
            .args(["validate", "--spec", &fixture("petstore-v3.json")])
            .args(["--method", "PATCH", "--path", "/api/pets", "--json"])
            .assert()
            .code(1)
            .stdout(predicate::str::contains(r#""allowed":["GET","POST"]"#));
    }

    #[test]
    fn unknown_path_passes() {
        cmd()
            .args(["validate", "--spec", &fixture("petstore-v3.json")])
            .args(["--method", "GET", "--path", "/api/unknown"])
            .assert()
            .success();
    }

    #[test]
    fn config_file_supplies_spec_and_exclusions() {
        let dir = TempDir::new().unwrap();
        let config = write_temp_file(
            &dir,
            "validator.yaml",
            &format!(
                "schema-location: {}\nexclude-path-patterns:\n  - /api/pets/*\n",
                fixture("petstore-v3.json")
            ),
        );

        cmd()
            .args(["validate", "--config", config.to_str().unwrap()])
            .args(["--method", "GET", "--path", "/api/pets/seven"])
            .assert()
            .success();
    }

    #[test]
    fn base_path_override() {
        cmd()
            .args(["validate", "--spec", &fixture("petstore-v3.json")])
            .args(["--base-path", "/v9", "--method", "GET", "--path", "/v9/pets/x"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("path parameter id"));
    }

    #[test]
    fn malformed_body() {
        let dir = TempDir::new().unwrap();
        let body = write_temp_file(&dir, "pet.json", "{ not json");

        cmd()
            .args(["validate", "--spec", &fixture("petstore-v3.json")])
            .args(["--method", "POST", "--path", "/api/pets"])
            .args(["--body", body.to_str().unwrap()])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("The payload could not be parsed"));
    }

    #[test]
    fn missing_spec_file() {
        cmd()
            .args(["validate", "--spec", "/nonexistent/openapi.json"])
            .args(["--method", "GET", "--path", "/pets"])
            .assert()
            .code(3)
            .stderr(predicate::str::contains("file not found"));
    }

    #[test]
    fn unsupported_document() {
        let dir = TempDir::new().unwrap();
        let spec = write_temp_file(&dir, "spec.yaml", "info:\n  title: nothing\n");

        cmd()
            .args(["validate", "--spec", spec.to_str().unwrap()])
            .args(["--method", "GET", "--path", "/pets"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("unsupported API document"));
    }

    #[test]
    fn unsupported_format_is_spec_error() {
        let dir = TempDir::new().unwrap();
        let spec = write_temp_file(
            &dir,
            "spec.json",
            r#"{"swagger":"2.0","paths":{"/a/{id}":{"get":{"parameters":[
                {"name":"id","in":"path","required":true,"type":"integer","format":"int128"}]}}}}"#,
        );

        cmd()
            .args(["validate", "--spec", spec.to_str().unwrap()])
            .args(["--method", "GET", "--path", "/a/1", "--json"])
            .assert()
            .code(2)
            .stdout(predicate::str::contains("with format int128"));
    }

    #[test]
    fn missing_body_file() {
        cmd()
            .args(["validate", "--spec", &fixture("petstore-v3.json")])
            .args(["--method", "POST", "--path", "/api/pets", "--body", "/nonexistent/body.json"])
            .assert()
            .code(3);
    }
}

mod routes_command {
    use super::*;

    #[test]
    fn lists_templates_and_methods() {
        cmd()
            .args(["routes", "--spec", &fixture("petstore-v3.json")])
            .assert()
            .success()
            .stdout(predicate::str::contains("base path: /api"))
            .stdout(predicate::str::contains("GET, POST"))
            .stdout(predicate::str::contains("/pets/{id}/weight"));
    }

    #[test]
    fn json_output() {
        cmd()
            .args(["routes", "--spec", &fixture("petstore-v2.yaml"), "--json"])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""basePath":"/v2""#))
            .stdout(predicate::str::contains(
                r#"{"path":"/owners/{ownerId}/pets/{petId}","methods":["PUT"]}"#,
            ));
    }
}
