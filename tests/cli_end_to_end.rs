use assert_cmd::Command;
use httpmock::MockServer;
use predicates::str::contains;
use std::io::Write;
use tempfile::NamedTempFile;

fn image_file(contents: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("tmp file");
    file.write_all(contents).expect("write image");
    file
}

fn jpeg() -> NamedTempFile {
    image_file(b"\xFF\xD8\xFF\xE0zackweg-test-image")
}

fn zackweg() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("zackweg"));
    cmd.env_remove("ZACKWEG_CONFIG_FILE")
        .env_remove("ZACKWEG_API__TOKEN")
        .env_remove("ZACKWEG_API__BASE_URL")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn upload_prints_remote_urls() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("POST")
            .path("/images/upload")
            .header("content-type", "image/jpeg");
        then.status(201)
            .header("content-type", "application/json")
            .body(r#"{"url":"https://cdn.test/img/1.jpg"}"#);
    });

    let image = jpeg();
    let assert = zackweg()
        .arg("upload")
        .arg("--api-base-url")
        .arg(server.base_url())
        .arg(image.path())
        .assert()
        .success()
        .stderr(contains("1/1 uploaded, 0 failed"));

    let output = String::from_utf8_lossy(&assert.get_output().stdout);
    assert!(output.contains("\"status\": \"uploaded\""));
    assert!(output.contains("https://cdn.test/img/1.jpg"));
    mock.assert();
}

#[test]
fn failed_upload_exits_non_zero_with_server_message() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("POST").path("/images/upload");
        then.status(400)
            .header("content-type", "application/json")
            .body(r#"{"message":"Image is corrupt"}"#);
    });

    let image = jpeg();
    let assert = zackweg()
        .arg("upload")
        .arg("--api-base-url")
        .arg(server.base_url())
        .arg("--retries")
        .arg("1")
        .arg(image.path())
        .assert()
        .failure()
        .stderr(contains("0/1 uploaded, 1 failed"))
        .stderr(contains("1 of 1 images failed to upload"));

    let output = String::from_utf8_lossy(&assert.get_output().stdout);
    assert!(output.contains("\"status\": \"failed\""));
    assert!(output.contains("Image is corrupt"));
    mock.assert_hits(2);
}

#[test]
fn non_jpeg_files_are_rejected_locally() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("POST").path("/images/upload");
        then.status(201).body(r#"{"url":"https://cdn.test/never.jpg"}"#);
    });

    let image = image_file(b"GIF89a-not-a-jpeg");
    zackweg()
        .arg("upload")
        .arg("--api-base-url")
        .arg(server.base_url())
        .arg(image.path())
        .assert()
        .failure()
        .stdout(contains("not a decodable JPEG"));

    mock.assert_hits(0);
}

#[test]
fn create_uploads_images_then_posts_the_listing() {
    let server = MockServer::start();
    let upload = server.mock(|when, then| {
        when.method("POST")
            .path("/images/upload")
            .header("authorization", "Bearer env-token");
        then.status(201)
            .header("content-type", "application/json")
            .body(r#"{"url":"https://cdn.test/img/bike.jpg"}"#);
    });
    let create = server.mock(|when, then| {
        when.method("POST")
            .path("/posts")
            .header("authorization", "Bearer env-token")
            .json_body_includes(
                r#"{"title":"City bike","price_cents":12000,"image_urls":["https://cdn.test/img/bike.jpg"]}"#,
            );
        then.status(201)
            .header("content-type", "application/json")
            .body(
                r#"{"id":"0b7e3f52-6a1c-4d7e-9a55-3c2f1e8d9b40","title":"City bike","description":"Red","price_cents":12000,"category":null,"image_urls":["https://cdn.test/img/bike.jpg"],"created_at":"2026-03-01T10:00:00Z","updated_at":"2026-03-01T10:00:00Z"}"#,
            );
    });

    let image = jpeg();
    zackweg()
        .env("ZACKWEG_API__BASE_URL", server.base_url())
        .env("ZACKWEG_API__TOKEN", "env-token")
        .arg("create")
        .arg("--title")
        .arg("City bike")
        .arg("--description")
        .arg("Red")
        .arg("--price")
        .arg("12000")
        .arg("--require-images")
        .arg("--image")
        .arg(image.path())
        .assert()
        .success()
        .stdout(contains("0b7e3f52-6a1c-4d7e-9a55-3c2f1e8d9b40"));

    upload.assert();
    create.assert();
}

#[test]
fn create_without_required_images_is_blocked() {
    let server = MockServer::start();
    let create = server.mock(|when, then| {
        when.method("POST").path("/posts");
        then.status(201);
    });

    zackweg()
        .arg("create")
        .arg("--api-base-url")
        .arg(server.base_url())
        .arg("--title")
        .arg("City bike")
        .arg("--description")
        .arg("Red")
        .arg("--require-images")
        .assert()
        .failure()
        .stderr(contains("at least one image is required"));

    create.assert_hits(0);
}

#[test]
fn invalid_configuration_fails_fast() {
    zackweg()
        .arg("upload")
        .arg("--request-timeout-seconds")
        .arg("0")
        .arg("missing.jpg")
        .assert()
        .failure()
        .stderr(contains("api.request_timeout_seconds"));
}
