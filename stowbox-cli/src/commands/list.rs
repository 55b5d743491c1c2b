use std::sync::Arc;

use serde::Serialize;
use stowbox::{AppendedBox, AppendedEntry, AppendedRegistry, EntryKind};

use crate::cli::ListArgs;
use crate::error::{Error, Result};
use crate::util::{format_path, format_size, format_time};

#[derive(Serialize)]
struct JsonEntry {
    #[serde(rename = "box")]
    box_name: String,
    path: String,
    #[serde(rename = "type")]
    entry_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    size: Option<u64>,
    modified: String,
}

fn sorted_boxes(registry: &AppendedRegistry) -> Vec<&Arc<AppendedBox>> {
    let mut boxes: Vec<_> = registry.iter().collect();
    boxes.sort_by(|a, b| a.name().cmp(b.name()));
    boxes
}

fn sorted_entries(bx: &AppendedBox) -> Vec<&AppendedEntry> {
    let mut entries: Vec<_> = bx.entries().collect();
    entries.sort_by(|a, b| a.path().cmp(b.path()));
    entries
}

fn file_size(entry: &AppendedEntry) -> Option<u64> {
    match entry.kind() {
        EntryKind::File { size, .. } => Some(size),
        EntryKind::Directory => None,
    }
}

pub fn run(args: ListArgs) -> Result<()> {
    let registry =
        AppendedRegistry::scan_path(&args.binary).map_err(|source| Error::ReadExecutable {
            path: args.binary.clone(),
            source,
        })?;

    if registry.is_empty() {
        return Err(Error::NoAppendedBoxes {
            path: args.binary.clone(),
        });
    }

    if args.json {
        list_json(&registry)
    } else if args.long {
        list_long(&registry)
    } else {
        list_compact(&registry)
    }
}

fn list_compact(registry: &AppendedRegistry) -> Result<()> {
    println!("{:>8}  {:>12}  {:20}  Box", "Entries", "Size", "Modified");
    println!("{}", "-".repeat(60));

    for bx in sorted_boxes(registry) {
        let size: u64 = bx.entries().filter_map(file_size).sum();
        let time = bx.time().map(format_time).unwrap_or_else(|| "-".into());
        println!(
            "{:>8}  {:>12}  {:20}  {}",
            bx.len(),
            format_size(size),
            time,
            bx.name()
        );
    }

    Ok(())
}

fn list_long(registry: &AppendedRegistry) -> Result<()> {
    println!("{:>12}  {:20}  Path", "Size", "Modified");
    println!("{}", "-".repeat(80));

    for bx in sorted_boxes(registry) {
        for entry in sorted_entries(bx) {
            let size = file_size(entry)
                .map(format_size)
                .unwrap_or_else(|| "-".into());
            println!(
                "{:>12}  {:20}  {}",
                size,
                format_time(entry.modified()),
                format_path(bx.name(), entry.path().as_str(), entry.is_dir())
            );
        }
    }

    Ok(())
}

fn json_entries(registry: &AppendedRegistry) -> Vec<JsonEntry> {
    let mut out = vec![];
    for bx in sorted_boxes(registry) {
        for entry in sorted_entries(bx) {
            out.push(JsonEntry {
                box_name: bx.name().to_string(),
                path: entry.path().to_string(),
                entry_type: if entry.is_dir() { "directory" } else { "file" }.to_string(),
                size: file_size(entry),
                modified: format_time(entry.modified()),
            });
        }
    }
    out
}

fn list_json(registry: &AppendedRegistry) -> Result<()> {
    let json = serde_json::to_string_pretty(&json_entries(registry))
        .map_err(|source| Error::Serialize { source })?;
    println!("{}", json);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::time::{Duration, UNIX_EPOCH};
    use stowbox::{AppendWriter, BoxPath};

    #[test]
    fn json_listing_is_sorted() {
        let mut image = Cursor::new(b"exe".to_vec());
        image.set_position(3);
        let mut writer = AppendWriter::new(image);
        let time = UNIX_EPOCH + Duration::from_secs(1_594_051_142);
        writer
            .add_file("b", &BoxPath::new("z.txt").unwrap(), b"zz", time)
            .unwrap();
        writer
            .add_file("a", &BoxPath::new("dir/y.txt").unwrap(), b"y", time)
            .unwrap();
        let registry = AppendedRegistry::from_bytes(writer.finish().unwrap().into_inner());

        let value = serde_json::to_value(json_entries(&registry)).unwrap();
        assert_eq!(
            value,
            serde_json::json!([
                {"box": "a", "path": "dir", "type": "directory", "modified": "2020-07-06T15:59:02Z"},
                {"box": "a", "path": "dir/y.txt", "type": "file", "size": 1, "modified": "2020-07-06T15:59:02Z"},
                {"box": "b", "path": "z.txt", "type": "file", "size": 2, "modified": "2020-07-06T15:59:02Z"},
            ])
        );
    }

    #[test]
    fn plain_binaries_have_nothing_to_list() {
        let temp = tempfile::tempdir().unwrap();
        let exe = temp.path().join("app");
        std::fs::write(&exe, b"nothing appended").unwrap();

        let err = run(ListArgs {
            binary: exe,
            long: false,
            json: false,
        })
        .unwrap_err();
        assert!(matches!(err, Error::NoAppendedBoxes { .. }));
    }
}
