//! Integration test for the compare service against a real directory.
//!
//! Exercises: CompareService::new, list_tree, file_content, compare, and the
//! JSON shape of the compare response.

use std::fs;
use std::path::Path;

use filecmp_core::{
    CompareRequest, CompareService, Config, DiffKind, FileTreeNode, FsError, Side,
};

fn write(root: &Path, rel: &str, content: &[u8]) -> String {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path.to_string_lossy().to_string()
}

fn find<'a>(node: &'a FileTreeNode, name: &str) -> Option<&'a FileTreeNode> {
    node.children.as_ref()?.iter().find(|c| c.name == name)
}

#[test]
fn full_compare_lifecycle() {
    let dir = tempfile::TempDir::new().unwrap();
    let root = dir.path();
    let left = write(root, "v1/config.ini", b"[core]\nname = demo\nmode = fast\n");
    let right = write(root, "v2/config.ini", b"[core]\nname = demo\nmode = safe\nextra = 1\n");
    write(root, "v1/.hidden", b"skip me");
    write(root, "v2/dist/bundle.js", b"skip me too");

    let service = CompareService::new(&Config::default());

    // Tree: hidden files and excluded dirs are gone, order is lexicographic
    let tree = service.list_tree(&root.to_string_lossy()).unwrap();
    let names: Vec<&str> = tree
        .children
        .as_ref()
        .unwrap()
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(names, vec!["v1", "v2"]);
    let v1 = find(&tree, "v1").unwrap();
    assert_eq!(v1.children.as_ref().unwrap().len(), 1, "only config.ini survives");
    let v2 = find(&tree, "v2").unwrap();
    assert!(find(v2, "dist").is_none(), "dist is excluded");
    let config = find(v2, "config.ini").unwrap();
    assert_eq!(config.path, right);
    assert!(!config.is_directory);

    // Content round trip keeps the path
    let content = service.file_content(&left).unwrap();
    assert_eq!(content.path, left);
    assert_eq!(content.content, "[core]\nname = demo\nmode = fast\n");

    // Compare
    let response = service.compare(&CompareRequest::new(&left, &right)).unwrap();
    assert_eq!(response.file1, left);
    assert_eq!(response.file2, right);
    let kinds: Vec<DiffKind> = response.diff.iter().map(|row| row.kind).collect();
    assert_eq!(
        kinds,
        vec![DiffKind::Equal, DiffKind::Equal, DiffKind::Replace, DiffKind::Insert]
    );
    let replaced = &response.diff[2];
    assert_eq!(replaced.left_content.as_deref(), Some("mode = fast\n"));
    assert_eq!(replaced.right_content.as_deref(), Some("mode = safe\n"));
    assert_eq!(response.diff[3].right_line_number, Some(4));
    assert_eq!(response.diff[3].left_line_number, None);

    // Wire shape: original key names, nulls kept
    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["diff"][3]["type"], "insert");
    assert!(json["diff"][3]["line_number_left"].is_null());
    assert!(json["diff"][3]["content_left"].is_null());
    assert_eq!(json["diff"][3]["content_right"], "extra = 1\n");
    assert_eq!(json["stats"]["insert"], 1);
}

#[test]
fn compare_against_itself_is_identity() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = write(dir.path(), "same.txt", b"one\ntwo\n\nthree");

    let service = CompareService::new(&Config::default());
    let response = service.compare(&CompareRequest::new(&path, &path)).unwrap();

    assert_eq!(response.diff.len(), 4);
    for (index, row) in response.diff.iter().enumerate() {
        assert_eq!(row.kind, DiffKind::Equal);
        assert_eq!(row.left_line_number, Some(index as u32 + 1));
        assert_eq!(row.right_line_number, row.left_line_number);
    }
    assert!(response.stats.is_identical());
}

#[test]
fn compare_failures_name_the_side() {
    let dir = tempfile::TempDir::new().unwrap();
    let text = write(dir.path(), "ok.txt", b"fine\n");
    let binary = write(dir.path(), "blob.bin", &[0xff, 0xfe, 0xfd]);
    let missing = dir.path().join("gone.txt").to_string_lossy().to_string();

    let service = CompareService::new(&Config::default());

    let err = service.compare(&CompareRequest::new(&missing, &text)).unwrap_err();
    assert_eq!(err.side, Side::Left);
    assert!(matches!(err.source, FsError::NotFound(_)));
    assert_eq!(err.status(), 404);

    let err = service.compare(&CompareRequest::new(&text, &binary)).unwrap_err();
    assert_eq!(err.side, Side::Right);
    assert!(matches!(err.source, FsError::NotText(_)));
    assert_eq!(err.status(), 400);

    let dir_path = dir.path().to_string_lossy().to_string();
    let err = service.compare(&CompareRequest::new(&text, &dir_path)).unwrap_err();
    assert_eq!(err.side, Side::Right);
    assert!(matches!(err.source, FsError::NotAFile(_)));
}

#[test]
fn size_limit_from_config_applies() {
    let dir = tempfile::TempDir::new().unwrap();
    let small = write(dir.path(), "small.txt", b"ok\n");
    let big = write(dir.path(), "big.txt", &[b'x'; 64]);

    let mut config = Config::default();
    config.limits.max_file_bytes = 16;
    let service = CompareService::new(&config);

    assert!(service.file_content(&small).is_ok());
    let err = service.compare(&CompareRequest::new(&small, &big)).unwrap_err();
    assert_eq!(err.side, Side::Right);
    assert_eq!(err.kind(), "too_large");
}

#[test]
fn tree_errors_for_bad_roots() {
    let dir = tempfile::TempDir::new().unwrap();
    let file = write(dir.path(), "file.txt", b"x");
    let service = CompareService::new(&Config::default());

    let err = service
        .list_tree(&dir.path().join("nope").to_string_lossy())
        .unwrap_err();
    assert!(matches!(err, FsError::NotFound(_)));

    let err = service.list_tree(&file).unwrap_err();
    assert!(matches!(err, FsError::NotADirectory(_)));
}

#[test]
fn compare_request_accepts_both_key_styles() {
    let original: CompareRequest =
        serde_json::from_str(r#"{"file1_path":"/a","file2_path":"/b"}"#).unwrap();
    let named: CompareRequest =
        serde_json::from_str(r#"{"path_left":"/a","path_right":"/b"}"#).unwrap();
    assert_eq!(original, named);
    assert_eq!(original, CompareRequest::new("/a", "/b"));

    let missing = serde_json::from_str::<CompareRequest>(r#"{"file1_path":"/a"}"#);
    assert!(missing.is_err(), "both paths are required");
}
