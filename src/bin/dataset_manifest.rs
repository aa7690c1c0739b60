//! Write `<file>.manifest.json` next to a source table.
//!
//! Usage: dataset_manifest <merged|oflog> <path>

use authority_explorer::data::{default_manifest_path, Dataset, DatasetKind};
use std::env;
use std::fs;
use std::path::PathBuf;

fn main() {
    let kind_arg = env::args().nth(1).unwrap_or_else(|| "merged".to_string());
    let Some(kind) = DatasetKind::from_slug(&kind_arg) else {
        eprintln!("unknown dataset {:?}: expected merged or oflog", kind_arg);
        std::process::exit(1);
    };
    let path = env::args().nth(2).map(PathBuf::from).unwrap_or_else(|| match kind {
        DatasetKind::Merged => PathBuf::from("Merged_Local_Authority_Data.csv"),
        DatasetKind::Oflog => PathBuf::from("Oflog.csv"),
    });

    let dataset = match Dataset::load(kind, &path) {
        Ok(d) => d,
        Err(err) => {
            eprintln!("load failed: {}", err);
            std::process::exit(2);
        }
    };

    let out_path = default_manifest_path(&path);
    let payload = match serde_json::to_string_pretty(dataset.manifest()) {
        Ok(p) => p,
        Err(err) => {
            eprintln!("cannot encode manifest: {}", err);
            std::process::exit(3);
        }
    };
    if let Err(err) = fs::write(&out_path, payload) {
        eprintln!("failed to write {}: {}", out_path.display(), err);
        std::process::exit(4);
    }
    println!("wrote manifest {}", out_path.display());
}
