use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::UNIX_EPOCH;

use stowbox::{AppendWriter, AppendedRegistry, BoxPath, EmbeddedBox, ResourceBox};

const TEXT: &str = "This is a test file.\nIt has a couple of lines.\n";

fn testdata() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("testdata")
}

fn embedded() -> ResourceBox {
    let bx = EmbeddedBox::from_directory("testdata", testdata()).unwrap();
    ResourceBox::from_embedded(Arc::new(bx))
}

fn appended() -> ResourceBox {
    let mut writer = AppendWriter::new(std::io::Cursor::new(Vec::new()));
    writer.add_tree("testdata", testdata()).unwrap();
    let image = writer.finish().unwrap().into_inner();

    let registry = AppendedRegistry::from_bytes(image);
    ResourceBox::from_appended(registry.find("testdata").unwrap().clone())
}

fn filesystem() -> ResourceBox {
    ResourceBox::from_directory("testdata", testdata())
}

fn every_backend() -> Vec<ResourceBox> {
    vec![embedded(), appended(), filesystem()]
}

#[test]
fn reads_whole_file() {
    for bx in every_backend() {
        let mut file = bx.open("test.txt").unwrap();
        let mut content = String::new();
        file.read_to_string(&mut content).unwrap();
        assert_eq!(content, TEXT, "{:?}", bx.backing());

        let meta = file.stat().unwrap();
        assert_eq!(meta.name(), "test.txt");
        assert_eq!(meta.len(), TEXT.len() as u64);
        assert!(meta.is_file());
    }
}

#[test]
fn seeks_and_reads_tail() {
    for bx in every_backend() {
        let mut file = bx.open("test.txt").unwrap();
        assert_eq!(file.seek(SeekFrom::End(-6)).unwrap(), TEXT.len() as u64 - 6);

        let mut tail = String::new();
        file.read_to_string(&mut tail).unwrap();
        assert_eq!(tail, "ines.\n");

        let mut buf = [0u8; 8];
        assert_eq!(file.read(&mut buf).unwrap(), 0);

        file.seek(SeekFrom::Start(5)).unwrap();
        let mut word = [0u8; 2];
        file.read_exact(&mut word).unwrap();
        assert_eq!(&word, b"is");
    }
}

#[test]
fn virtual_files_reject_out_of_range_seeks() {
    for bx in [embedded(), appended()] {
        let mut file = bx.open("test.txt").unwrap();
        file.seek(SeekFrom::Start(3)).unwrap();

        let err = file.seek(SeekFrom::Current(-10)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        let err = file.seek(SeekFrom::Start(TEXT.len() as u64 + 1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        assert_eq!(file.stream_position().unwrap(), 3);
    }
}

#[test]
fn closed_files_stop_reading() {
    for bx in every_backend() {
        let mut file = bx.open("test.txt").unwrap();
        file.close().unwrap();
        file.close().unwrap();

        let mut buf = [0u8; 4];
        assert!(file.read(&mut buf).is_err());
    }
}

#[test]
fn directories_list_in_chunks() {
    for bx in every_backend() {
        let mut dir = bx.open("assets").unwrap();
        assert!(dir.is_dir());
        assert!(dir.stat().unwrap().is_dir());

        let mut seen = vec![];
        loop {
            let chunk = dir.readdir(1).unwrap();
            if chunk.is_empty() {
                break;
            }
            assert_eq!(chunk.len(), 1);
            seen.extend(chunk.into_iter().map(|m| m.name().to_string()));
        }
        seen.sort();
        assert_eq!(seen, ["a.txt", "sub"]);
    }
}

#[test]
fn directories_refuse_reads_and_files_refuse_listing() {
    for bx in every_backend() {
        let mut dir = bx.open("assets/sub").unwrap();
        let mut buf = [0u8; 4];
        assert_eq!(dir.read(&mut buf).unwrap_err().kind(), ErrorKind::IsADirectory);

        let mut file = bx.open("assets/sub/b.txt").unwrap();
        assert_eq!(file.readdir(0).unwrap_err().kind(), ErrorKind::Unsupported);
    }
}

#[test]
fn missing_entries_are_not_found() {
    for bx in every_backend() {
        assert!(bx.open("assets/nope.txt").unwrap_err().is_not_found());
        assert!(bx.bytes("nope").unwrap_err().is_not_found());
    }
}

#[test]
fn walk_agrees_across_backends() {
    let walk = |bx: &ResourceBox| {
        let mut seen = vec![];
        bx.walk("assets", |path, meta| {
            let meta = meta?;
            seen.push((path.to_string(), meta.is_dir()));
            Ok::<_, stowbox::Error>(stowbox::WalkAction::Continue)
        })
        .unwrap();
        seen
    };

    let expected = [
        ("assets".to_string(), true),
        ("assets/a.txt".to_string(), false),
        ("assets/sub".to_string(), true),
        ("assets/sub/b.txt".to_string(), false),
    ];
    for bx in every_backend() {
        assert_eq!(walk(&bx), expected);
    }
}

#[test]
fn embedded_snapshot_keeps_paths() {
    let bx = EmbeddedBox::from_directory("testdata", testdata()).unwrap();
    let mut files: Vec<_> = bx.files().map(|f| f.path().to_string()).collect();
    files.sort();
    assert_eq!(files, ["assets/a.txt", "assets/sub/b.txt", "test.txt"]);
    assert!(bx.dir("assets/sub").is_some());
    assert_eq!(
        BoxPath::new("assets/sub/b.txt").unwrap().parent(),
        Some(BoxPath::new("assets/sub").unwrap())
    );
}
