use std::io::Read;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use stowbox::{
    AppendWriter, AppendedRegistry, BaseDir, BoxPath, EmbeddedBox, Error, FindOptions,
    LocateMethod, Registry,
};

fn registration_time() -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(1_594_051_142)
}

fn embedded_assets() -> EmbeddedBox {
    let time = registration_time();
    EmbeddedBox::builder("assets", time)
        .dir("sub", time)
        .file("a.txt", &b"hello"[..], time)
        .file("sub/b.txt", &b"world"[..], time)
        .build()
        .unwrap()
}

fn appended_image() -> Vec<u8> {
    let mut cursor = std::io::Cursor::new(b"#!/not/really/an/executable\n".to_vec());
    cursor.set_position(cursor.get_ref().len() as u64);

    let mut writer = AppendWriter::new(cursor);
    let time = registration_time();
    writer
        .add_file("pics/myapp", &BoxPath::new("logo.png").unwrap(), b"png!", time)
        .unwrap();
    writer
        .add_file("pics/myapp", &BoxPath::new("icons/a.png").unwrap(), b"icon", time)
        .unwrap();
    writer
        .add_file("assets", &BoxPath::new("a.txt").unwrap(), b"appended", time)
        .unwrap();
    writer.finish().unwrap().into_inner()
}

fn testdata() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("testdata")
}

fn names(file: &mut stowbox::File) -> Vec<String> {
    file.readdir(0)
        .unwrap()
        .into_iter()
        .map(|m| m.name().to_string())
        .collect()
}

#[test]
fn embedded_box_reads() {
    let mut registry = Registry::new();
    registry.register_embedded("assets", embedded_assets());

    let bx = registry.find_box("assets").unwrap();
    assert!(bx.is_embedded());
    assert_eq!(bx.time(), registration_time());

    let mut root = bx.open("").unwrap();
    assert_eq!(names(&mut root), ["sub", "a.txt"]);
    assert!(root.readdir(0).unwrap().is_empty());

    assert_eq!(bx.bytes("sub/b.txt").unwrap(), b"world");
    assert_eq!(bx.string("a.txt").unwrap(), "hello");

    let err = bx.open("missing.txt").unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn appended_box_reads() {
    let registry = Registry::with_appended(AppendedRegistry::from_bytes(appended_image()));

    let bx = registry.find_box("pics/myapp").unwrap();
    assert!(bx.is_appended());
    assert!(!bx.is_embedded());
    assert_eq!(bx.time(), registration_time());

    let mut root = bx.open("/").unwrap();
    assert!(root.is_dir());
    assert_eq!(names(&mut root), ["icons", "logo.png"]);

    let mut icons = bx.open("icons").unwrap();
    assert_eq!(names(&mut icons), ["a.png"]);

    let mut logo = bx.open("logo.png").unwrap();
    let mut content = vec![];
    logo.read_to_end(&mut content).unwrap();
    assert_eq!(content, b"png!");
    assert_eq!(logo.stat().unwrap().len(), 4);

    assert_eq!(bx.bytes("icons/a.png").unwrap(), b"icon");
    assert!(bx.bytes("nope").unwrap_err().is_not_found());
}

#[test]
fn embedded_takes_precedence_over_appended() {
    let mut registry = Registry::with_appended(AppendedRegistry::from_bytes(appended_image()));
    registry.register_embedded("assets", embedded_assets());

    let bx = registry.find_box("assets").unwrap();
    assert!(bx.is_embedded());
    assert_eq!(bx.string("a.txt").unwrap(), "hello");

    let options = FindOptions::new().order([LocateMethod::Appended, LocateMethod::Embedded]);
    let bx = registry.find_box_with("assets", &options).unwrap();
    assert!(bx.is_appended());
    assert_eq!(bx.string("a.txt").unwrap(), "appended");
}

#[test]
fn filesystem_relative_to_caller() {
    let bx = Registry::new().find_box("testdata/assets").unwrap();
    assert!(bx.is_filesystem());
    assert_eq!(bx.string("sub/b.txt").unwrap(), "world");

    let mut root = bx.open("").unwrap();
    let mut listed = names(&mut root);
    listed.sort();
    assert_eq!(listed, ["a.txt", "sub"]);
}

#[test]
fn filesystem_with_explicit_base() {
    let options = FindOptions::new()
        .order([LocateMethod::Filesystem])
        .base_dir(BaseDir::Path(testdata()));
    let bx = Registry::new().find_box_with("assets", &options).unwrap();
    assert_eq!(bx.base_dir(), Some(testdata().join("assets").as_path()));
    assert_eq!(bx.bytes("a.txt").unwrap(), b"hello");
    assert!(bx.open("missing.txt").unwrap_err().is_not_found());
}

#[test]
fn unknown_boxes_are_not_found() {
    let mut registry = Registry::new();
    registry.register_embedded("assets", embedded_assets());

    let err = registry.find_box("does-not-exist").unwrap_err();
    assert!(matches!(err, Error::BoxNotFound { .. }));
    assert!(err.is_not_found());
}

#[test]
fn absolute_names_are_invalid() {
    let err = Registry::new().find_box("/tmp").unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
}

#[test]
fn located_boxes_are_shared_between_threads() {
    let mut registry = Registry::new();
    registry.register_embedded("assets", embedded_assets());
    let bx = registry.find_box("assets").unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let bx = bx.clone();
            std::thread::spawn(move || bx.must_string("sub/b.txt"))
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), "world");
    }
}
