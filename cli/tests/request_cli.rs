use assert_cmd::Command;
use httpmock::prelude::*;
use predicates::prelude::*;
use predicates::str::contains;
use std::fs;
use tempfile::{tempdir, TempDir};

const ENV_VARS: &[&str] = &["PASM_SERVER", "PASM_CA_CERT", "PASM_TOKEN", "PASM_TOKEN_HEADER"];

fn bare_cmd(tmp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("pasmcli").expect("pasmcli binary");
    for var in ENV_VARS {
        cmd.env_remove(var);
    }
    cmd.arg("--config").arg(tmp.path().join("config.toml"));
    cmd
}

fn pasmcli_cmd(server: &MockServer, tmp: &TempDir) -> Command {
    let mut cmd = bare_cmd(tmp);
    cmd.arg("--server")
        .arg(server.base_url())
        .arg("--token")
        .arg("test-token");
    cmd
}

#[test]
fn get_secret_metadata_prints_body_and_succeeds() {
    let server = MockServer::start();
    let tmp = tempdir().expect("tempdir");
    let m = server.mock(|when, then| {
        when.method(POST)
            .path("/1.0/GetSecretMetadata")
            .header("authorization", "Bearer test-token")
            .header("content-type", "application/json")
            .json_body_obj(&serde_json::json!({"box_id": "b1", "secret_id": "s1"}));
        then.status(200).body(r#"{"secret_id":"s1","value":"x"}"#);
    });

    pasmcli_cmd(&server, &tmp)
        .args(["get-secret-metadata", "--boxid", "b1", "--secretid", "s1"])
        .assert()
        .success()
        .stdout("\n{\"secret_id\":\"s1\",\"value\":\"x\"}\n\n");

    m.assert();
}

#[test]
fn empty_404_is_not_found() {
    let server = MockServer::start();
    let tmp = tempdir().expect("tempdir");
    let m = server.mock(|when, then| {
        when.method(POST).path("/1.0/GetSecretMetadata");
        then.status(404);
    });

    pasmcli_cmd(&server, &tmp)
        .args(["get-secret-metadata", "-b", "b1", "-s", "missing"])
        .assert()
        .code(5)
        .stdout("\nSecret not found\n\n");

    m.assert();
}

#[test]
fn error_key_exits_three_and_shows_body() {
    let server = MockServer::start();
    let tmp = tempdir().expect("tempdir");
    server.mock(|when, then| {
        when.method(POST).path("/1.0/GetSecretMetadata");
        then.status(400).body(r#"{"error":"invalid box_id"}"#);
    });

    pasmcli_cmd(&server, &tmp)
        .args(["get-secret-metadata", "-b", "nope", "-s", "s1"])
        .assert()
        .code(3)
        .stdout(contains(r#"{"error":"invalid box_id"}"#));
}

#[test]
fn error_key_with_200_still_exits_three() {
    let server = MockServer::start();
    let tmp = tempdir().expect("tempdir");
    server.mock(|when, then| {
        when.method(POST).path("/1.0/ListBoxes");
        then.status(200).body(r#"{"error":{"code":"denied"}}"#);
    });

    pasmcli_cmd(&server, &tmp)
        .arg("list-boxes")
        .assert()
        .code(3);
}

#[test]
fn malformed_body_falls_through_to_success() {
    let server = MockServer::start();
    let tmp = tempdir().expect("tempdir");
    server.mock(|when, then| {
        when.method(POST).path("/1.0/ListBoxes");
        then.status(502).body("<html>bad gateway</html>");
    });

    pasmcli_cmd(&server, &tmp)
        .arg("list-boxes")
        .assert()
        .success()
        .stdout(contains("<html>bad gateway</html>"));
}

#[test]
fn missing_ca_file_is_transport_failure() {
    let server = MockServer::start();
    let tmp = tempdir().expect("tempdir");
    let m = server.mock(|when, then| {
        when.method(POST);
        then.status(200).body("{}");
    });

    pasmcli_cmd(&server, &tmp)
        .arg("--ca-cert")
        .arg(tmp.path().join("missing-ca.pem"))
        .args(["get-secret-metadata", "-b", "b1", "-s", "s1"])
        .assert()
        .code(4)
        .stdout(contains("HTTP request failed:"))
        .stdout(contains("missing-ca.pem"))
        .stdout(contains("{}").not());

    m.assert_hits(0);
}

#[test]
fn connection_refused_is_transport_failure() {
    let tmp = tempdir().expect("tempdir");
    bare_cmd(&tmp)
        .args(["--server", "http://127.0.0.1:1", "--timeout-secs", "5"])
        .arg("list-boxes")
        .assert()
        .code(4)
        .stdout(contains("HTTP request failed: request failed: "))
        .stdout(contains("onnection refused"));
}

fn fixture(name: &str) -> std::path::PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[test]
fn valid_ca_file_is_accepted() {
    let server = MockServer::start();
    let tmp = tempdir().expect("tempdir");
    let m = server.mock(|when, then| {
        when.method(POST).path("/1.0/ListBoxes");
        then.status(200).body(r#"{"boxes":[]}"#);
    });

    for name in ["ca.pem", "ca.der"] {
        pasmcli_cmd(&server, &tmp)
            .arg("--ca-cert")
            .arg(fixture(name))
            .arg("list-boxes")
            .assert()
            .success()
            .stdout(contains(r#"{"boxes":[]}"#));
    }

    m.assert_hits(2);
}

#[test]
fn corrupt_ca_file_is_transport_failure() {
    let server = MockServer::start();
    let tmp = tempdir().expect("tempdir");
    let m = server.mock(|when, then| {
        when.method(POST);
        then.status(200).body("{}");
    });

    let garbage = tmp.path().join("garbage.pem");
    fs::write(
        &garbage,
        "-----BEGIN CERTIFICATE-----\n!!not base64!!\n-----END CERTIFICATE-----\n",
    )
    .expect("write");

    pasmcli_cmd(&server, &tmp)
        .arg("--ca-cert")
        .arg(&garbage)
        .arg("list-boxes")
        .assert()
        .code(4)
        .stdout(contains("invalid CA certificate"))
        .stdout(contains("garbage.pem"));

    m.assert_hits(0);
}

#[test]
fn list_boxes_sends_only_given_flags() {
    let server = MockServer::start();
    let tmp = tempdir().expect("tempdir");
    let m = server.mock(|when, then| {
        when.method(POST)
            .path("/1.0/ListBoxes")
            .json_body_obj(&serde_json::json!({"prefix": "prod", "max_items": 5}));
        then.status(200).body(r#"{"boxes":[]}"#);
    });

    pasmcli_cmd(&server, &tmp)
        .args(["list-boxes", "--prefix", "prod", "--max-items", "5"])
        .assert()
        .success()
        .stdout(contains(r#"{"boxes":[]}"#));

    m.assert();
}

#[test]
fn list_boxes_repeated_field_flag_becomes_array() {
    let server = MockServer::start();
    let tmp = tempdir().expect("tempdir");
    let m = server.mock(|when, then| {
        when.method(POST)
            .path("/1.0/ListBoxes")
            .json_body_obj(&serde_json::json!({
                "fields": ["name", "owner"],
                "next_token": "t2"
            }));
        then.status(200).body(r#"{"boxes":[]}"#);
    });

    pasmcli_cmd(&server, &tmp)
        .args(["list-boxes", "-f", "name", "-f", "owner", "-n", "t2"])
        .assert()
        .success();

    m.assert();
}

#[test]
fn list_boxes_not_found_message() {
    let server = MockServer::start();
    let tmp = tempdir().expect("tempdir");
    server.mock(|when, then| {
        when.method(POST).path("/1.0/ListBoxes");
        then.status(404);
    });

    pasmcli_cmd(&server, &tmp)
        .arg("list-boxes")
        .assert()
        .code(5)
        .stdout(contains("Boxes not found"));
}

#[test]
fn custom_token_header_and_api_version() {
    let server = MockServer::start();
    let tmp = tempdir().expect("tempdir");
    let m = server.mock(|when, then| {
        when.method(POST)
            .path("/2.0/ListBoxes")
            .header("x-auth-token", "test-token");
        then.status(200).body("{}");
    });

    pasmcli_cmd(&server, &tmp)
        .args(["--token-header", "X-Auth-Token", "--api-version", "2.0"])
        .arg("list-boxes")
        .assert()
        .success();

    m.assert();
}

#[test]
fn request_escape_hatch_posts_raw_object() {
    let server = MockServer::start();
    let tmp = tempdir().expect("tempdir");
    let m = server.mock(|when, then| {
        when.method(POST)
            .path("/1.0/GetBox")
            .json_body_obj(&serde_json::json!({"box_id": "b1"}));
        then.status(200).body(r#"{"box_id":"b1"}"#);
    });

    pasmcli_cmd(&server, &tmp)
        .args(["request", "GetBox", "--json", r#"{"box_id":"b1"}"#])
        .assert()
        .success();

    m.assert();
}

#[test]
fn request_with_invalid_json_is_encoding_failure() {
    let server = MockServer::start();
    let tmp = tempdir().expect("tempdir");
    let m = server.mock(|when, then| {
        when.method(POST);
        then.status(200).body("{}");
    });

    pasmcli_cmd(&server, &tmp)
        .args(["request", "GetBox", "--json", "{not json"])
        .assert()
        .code(1)
        .stdout(contains("Error building JSON request"));
    pasmcli_cmd(&server, &tmp)
        .args(["request", "GetBox", "--json", "[1,2]"])
        .assert()
        .code(1)
        .stdout(contains("must be a JSON object"));

    m.assert_hits(0);
}

#[test]
fn no_server_is_config_failure() {
    let tmp = tempdir().expect("tempdir");
    bare_cmd(&tmp)
        .arg("list-boxes")
        .assert()
        .code(1)
        .stdout("")
        .stderr(contains("no server configured"));
}

#[test]
fn save_config_persists_and_is_reused() {
    let server = MockServer::start();
    let tmp = tempdir().expect("tempdir");
    let m = server.mock(|when, then| {
        when.method(POST)
            .path("/1.0/ListBoxes")
            .header("authorization", "Bearer test-token");
        then.status(200).body("{}");
    });

    pasmcli_cmd(&server, &tmp)
        .arg("--save-config")
        .arg("list-boxes")
        .assert()
        .success();

    let saved = fs::read_to_string(tmp.path().join("config.toml")).expect("config written");
    assert!(saved.contains(&server.base_url()));
    assert!(saved.contains("test-token"));

    // second run relies on the stored server and token only
    bare_cmd(&tmp).arg("list-boxes").assert().success();

    m.assert_hits(2);
}
