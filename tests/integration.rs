//! End-to-end CLI tests driving the compiled `shelf` binary.
//!
//! Each test gets its own temp directory with a passthrough-summarizer
//! config, so no network or model is needed.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn shelf_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("shelf");
    path
}

/// Build a one-page PDF with the given text.
fn pdf_bytes(text: &str) -> Vec<u8> {
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 24.into()]),
            Operation::new("Td", vec![100.into(), 700.into()]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

fn setup_test_env_with_policy(on_duplicate: &str) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let config_content = format!(
        r#"[db]
path = "{root}/data/shelf.sqlite"

[blobs]
backend = "filesystem"
root = "{root}/data/blobs"

[summarizer]
provider = "passthrough"

[ingest]
on_duplicate = "{policy}"

[server]
bind = "127.0.0.1:7979"
"#,
        root = root.display(),
        policy = on_duplicate
    );

    let config_path = config_dir.join("shelf.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn setup_test_env() -> (TempDir, PathBuf) {
    setup_test_env_with_policy("reject")
}

fn run_shelf(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = shelf_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run shelf binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

/// Write a PDF fixture under the temp root and return its path.
fn write_pdf(tmp: &TempDir, name: &str, text: &str) -> PathBuf {
    let path = tmp.path().join(name);
    fs::write(&path, pdf_bytes(text)).unwrap();
    path
}

#[test]
fn test_init_creates_database() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_shelf(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
    assert!(tmp.path().join("data").join("shelf.sqlite").exists());
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env();

    let (_, _, success1) = run_shelf(&config_path, &["init"]);
    assert!(success1, "First init failed");

    let (_, _, success2) = run_shelf(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_ingest_and_read_all_variants() {
    let (tmp, config_path) = setup_test_env();
    run_shelf(&config_path, &["init"]);

    let pdf = write_pdf(&tmp, "q1.pdf", "Quarterly revenue grew");
    let (stdout, stderr, success) = run_shelf(
        &config_path,
        &["ingest", "reports", "q1.pdf", pdf.to_str().unwrap()],
    );
    assert!(
        success,
        "ingest failed: stdout={}, stderr={}",
        stdout, stderr
    );
    assert!(stdout.contains("Stored q1.pdf in folder reports"));

    for variant in ["full", "half", "small", "bullets"] {
        let (stdout, stderr, success) = run_shelf(
            &config_path,
            &["read", "reports", "q1.pdf", "--variant", variant],
        );
        assert!(success, "read {} failed: {}", variant, stderr);
        assert!(
            !stdout.trim().is_empty(),
            "variant {} should be non-empty",
            variant
        );
        // Passthrough copies the extracted text into every variant
        assert!(
            stdout.contains("Quarterly revenue grew"),
            "variant {} should carry the extracted text, got: {}",
            variant,
            stdout
        );
    }
}

#[test]
fn test_ingest_writes_blob() {
    let (tmp, config_path) = setup_test_env();
    run_shelf(&config_path, &["init"]);

    let pdf = write_pdf(&tmp, "q1.pdf", "Quarterly revenue grew");
    run_shelf(
        &config_path,
        &["ingest", "reports", "q1.pdf", pdf.to_str().unwrap()],
    );

    let blob_path = tmp.path().join("data").join("blobs").join("upload").join("q1.pdf");
    assert!(blob_path.exists(), "blob should exist at {:?}", blob_path);
    let stored = fs::read(&blob_path).unwrap();
    assert!(stored.starts_with(b"%PDF"));
}

#[test]
fn test_ingest_empty_folder_fails_validation() {
    let (tmp, config_path) = setup_test_env();
    run_shelf(&config_path, &["init"]);

    let pdf = write_pdf(&tmp, "q1.pdf", "body");
    let (_, stderr, success) = run_shelf(
        &config_path,
        &["ingest", "", "q1.pdf", pdf.to_str().unwrap()],
    );
    assert!(!success, "ingest with empty folder should fail");
    assert!(
        stderr.contains("validation failed") && stderr.contains("folder"),
        "should name the missing field, got: {}",
        stderr
    );

    // Nothing was written
    let (stdout, _, _) = run_shelf(&config_path, &["list"]);
    assert!(stdout.contains("No documents."));
    assert!(!tmp.path().join("data").join("blobs").exists());
}

#[test]
fn test_ingest_junk_bytes_fails_validation() {
    let (tmp, config_path) = setup_test_env();
    run_shelf(&config_path, &["init"]);

    let junk = tmp.path().join("junk.pdf");
    fs::write(&junk, b"not a pdf at all").unwrap();

    let (_, stderr, success) = run_shelf(
        &config_path,
        &["ingest", "reports", "junk.pdf", junk.to_str().unwrap()],
    );
    assert!(!success, "junk bytes should fail");
    assert!(stderr.contains("validation failed"), "got: {}", stderr);

    let (stdout, _, _) = run_shelf(&config_path, &["list"]);
    assert!(stdout.contains("No documents."));
}

#[test]
fn test_ingest_missing_file_fails() {
    let (tmp, config_path) = setup_test_env();
    run_shelf(&config_path, &["init"]);

    let missing = tmp.path().join("nope.pdf");
    let (_, stderr, success) = run_shelf(
        &config_path,
        &["ingest", "reports", "nope.pdf", missing.to_str().unwrap()],
    );
    assert!(!success);
    assert!(stderr.contains("Failed to read document"), "got: {}", stderr);
}

#[test]
fn test_list_keeps_folders_separate() {
    let (tmp, config_path) = setup_test_env();
    run_shelf(&config_path, &["init"]);

    for (folder, name, text) in [
        ("A", "one.pdf", "first document"),
        ("A", "two.pdf", "second document"),
        ("B", "three.pdf", "third document"),
    ] {
        let pdf = write_pdf(&tmp, name, text);
        let (_, stderr, success) = run_shelf(
            &config_path,
            &["ingest", folder, name, pdf.to_str().unwrap()],
        );
        assert!(success, "ingest {} failed: {}", name, stderr);
    }

    let (stdout, _, success) = run_shelf(&config_path, &["list"]);
    assert!(success);

    // Insert order puts folder A first; its files must appear before the
    // B heading and B's file after it.
    let idx_a = stdout.find("A/").unwrap();
    let idx_one = stdout.find("one.pdf").unwrap();
    let idx_two = stdout.find("two.pdf").unwrap();
    let idx_b = stdout.find("B/").unwrap();
    let idx_three = stdout.find("three.pdf").unwrap();
    assert!(idx_a < idx_one && idx_one < idx_b);
    assert!(idx_a < idx_two && idx_two < idx_b);
    assert!(idx_b < idx_three);
}

#[test]
fn test_duplicate_rejected_by_default() {
    let (tmp, config_path) = setup_test_env();
    run_shelf(&config_path, &["init"]);

    let pdf = write_pdf(&tmp, "q1.pdf", "original");
    let (_, _, success) = run_shelf(
        &config_path,
        &["ingest", "reports", "q1.pdf", pdf.to_str().unwrap()],
    );
    assert!(success);

    let (_, stderr, success) = run_shelf(
        &config_path,
        &["ingest", "reports", "q1.pdf", pdf.to_str().unwrap()],
    );
    assert!(!success, "duplicate ingest should fail under reject policy");
    assert!(stderr.contains("storage error"), "got: {}", stderr);
}

#[test]
fn test_duplicate_replace_policy_takes_last_write() {
    let (tmp, config_path) = setup_test_env_with_policy("replace");
    run_shelf(&config_path, &["init"]);

    let first = write_pdf(&tmp, "v1.pdf", "first version");
    let second = write_pdf(&tmp, "v2.pdf", "second version");

    run_shelf(
        &config_path,
        &["ingest", "reports", "q1.pdf", first.to_str().unwrap()],
    );
    let (_, stderr, success) = run_shelf(
        &config_path,
        &["ingest", "reports", "q1.pdf", second.to_str().unwrap()],
    );
    assert!(success, "replace policy should accept duplicate: {}", stderr);

    let (stdout, _, _) = run_shelf(
        &config_path,
        &["read", "reports", "q1.pdf", "--variant", "half"],
    );
    assert!(stdout.contains("second version"), "got: {}", stdout);

    // Still exactly one entry listed
    let (stdout, _, _) = run_shelf(&config_path, &["list"]);
    assert_eq!(stdout.matches("q1.pdf").count(), 1);
}

#[test]
fn test_read_missing_document_fails() {
    let (_tmp, config_path) = setup_test_env();
    run_shelf(&config_path, &["init"]);

    let (_, stderr, success) = run_shelf(&config_path, &["read", "missing", "none.pdf"]);
    assert!(!success, "read of missing document should fail");
    assert!(stderr.contains("not found"), "got: {}", stderr);
}

#[test]
fn test_read_unknown_variant_fails() {
    let (_tmp, config_path) = setup_test_env();
    run_shelf(&config_path, &["init"]);

    let (_, stderr, success) = run_shelf(
        &config_path,
        &["read", "reports", "q1.pdf", "--variant", "tiny"],
    );
    assert!(!success);
    assert!(stderr.contains("Unknown variant"), "got: {}", stderr);
}

#[test]
fn test_unknown_config_value_rejected() {
    let (tmp, config_path) = setup_test_env();
    let content = fs::read_to_string(&config_path)
        .unwrap()
        .replace("passthrough", "llama-local");
    let other = tmp.path().join("config").join("bad.toml");
    fs::write(&other, content).unwrap();

    let (_, stderr, success) = run_shelf(&other, &["init"]);
    assert!(!success);
    assert!(stderr.contains("Unknown summarizer provider"), "got: {}", stderr);
}
