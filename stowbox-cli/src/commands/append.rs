use std::path::{Path, PathBuf};

use stowbox::BoxPath;

use crate::cli::AppendArgs;
use crate::error::{Error, Result};

/// Splits `NAME=DIR`, or uses `DIR` as written for the name.
fn parse_box(spec: &str) -> Result<(String, PathBuf)> {
    let (name, dir) = match spec.split_once('=') {
        Some((name, dir)) => (name, dir),
        None => (spec, spec),
    };

    if name.is_empty() || dir.is_empty() || Path::new(name).has_root() {
        return Err(Error::InvalidBoxSpec {
            spec: spec.to_string(),
        });
    }

    // Box names always use forward slashes, whatever the platform.
    let name = BoxPath::from_platform(name)
        .ok()
        .filter(|p| !p.is_root())
        .ok_or_else(|| Error::InvalidBoxSpec {
            spec: spec.to_string(),
        })?;

    Ok((name.to_string(), PathBuf::from(dir)))
}

pub fn run(args: AppendArgs) -> Result<()> {
    let boxes = args
        .boxes
        .iter()
        .map(|spec| parse_box(spec))
        .collect::<Result<Vec<_>>>()?;

    for (_, dir) in &boxes {
        if !dir.is_dir() {
            return Err(Error::MissingBoxDirectory { path: dir.clone() });
        }
    }

    let count = stowbox::append_to_executable(&args.exec, &boxes).map_err(|source| {
        Error::AppendBoxes {
            path: args.exec.clone(),
            source,
        }
    })?;

    tracing::info!(exec = %args.exec.display(), boxes = boxes.len(), entries = count, "appended boxes");

    if !args.quiet {
        for (name, dir) in &boxes {
            println!("{} <- {}", name, dir.display());
        }
        println!(
            "Appended {} entries in {} boxes to {}",
            count,
            boxes.len(),
            args.exec.display()
        );
    }

    Ok(())
}
