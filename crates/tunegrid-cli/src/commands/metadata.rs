use std::fmt::Write as _;
use std::path::Path;

use tunegrid_metadata::{Metadata, MetadataEntry, Namespace};
use tunegrid_study::StudyConfig;

use crate::Format;

pub fn list(config: &str, ns: &str, format: Format) -> anyhow::Result<()> {
    let study = StudyConfig::from_file(Path::new(config))?;
    let view = study.metadata.abs_ns(Namespace::decode(ns));

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&entries_below(&view))?),
        Format::Text => print!("{}", format_metadata(&view)),
    }
    Ok(())
}

/// Entries at and below `view`'s namespace, with namespaces relative to it.
pub fn entries_below(view: &Metadata) -> Vec<MetadataEntry> {
    view.subnamespaces()
        .into_iter()
        .flat_map(|relative| {
            view.ns(&relative)
                .items()
                .into_iter()
                .map(move |(key, value)| MetadataEntry {
                    ns: relative.clone(),
                    key,
                    value,
                })
        })
        .collect()
}

pub fn format_metadata(view: &Metadata) -> String {
    let mut out = String::new();
    for relative in view.subnamespaces() {
        let label = view.current_namespace().join(&relative);
        let _ = writeln!(out, "[{}]", label.encode());
        for (key, value) in view.ns(&relative).items() {
            let _ = writeln!(out, "  {key} = {value}");
        }
    }
    out
}
