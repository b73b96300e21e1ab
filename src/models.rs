//! Core data types shared across the library services.

use serde::{Deserialize, Serialize};

/// One row of the `files` table: a document and its four text variants.
///
/// In summarization mode `full_text` holds the blob reference
/// (`"/upload/{filename}"`); in passthrough mode it holds the extracted
/// text itself.
#[derive(Debug, Clone)]
pub struct DocumentRecord {
    pub folder: String,
    pub filename: String,
    pub full_text: String,
    pub half_text: String,
    pub small_text: String,
    pub bullets: String,
}

/// The three derived variants returned by a summarizer.
///
/// Field names match the JSON object the model is instructed to produce.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Summary {
    #[serde(rename = "halfText")]
    pub half_text: String,
    #[serde(rename = "smallText")]
    pub small_text: String,
    pub bullets: String,
}

/// Which stored representation of a document to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Full,
    Half,
    Small,
    Bullets,
}

impl Variant {
    /// The `files` column holding this variant.
    pub fn column(&self) -> &'static str {
        match self {
            Variant::Full => "fullText",
            Variant::Half => "halfText",
            Variant::Small => "smallText",
            Variant::Bullets => "bullets",
        }
    }

    /// Maps the human-readable length labels used by the read entry point.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Full Text" => Some(Variant::Full),
            "Half Text" => Some(Variant::Half),
            "Small Text" => Some(Variant::Small),
            "Bullets" => Some(Variant::Bullets),
            _ => None,
        }
    }

    /// CLI spelling (`--variant full|half|small|bullets`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "full" => Some(Variant::Full),
            "half" => Some(Variant::Half),
            "small" => Some(Variant::Small),
            "bullets" => Some(Variant::Bullets),
            _ => None,
        }
    }
}

/// One folder and the filenames it contains, as returned by the list
/// entry point.
#[derive(Debug, Clone, Serialize)]
pub struct FolderListing {
    pub folder: String,
    pub files: Vec<String>,
}

/// Successful ingestion receipt.
#[derive(Debug, Clone, Serialize)]
pub struct Confirmation {
    pub folder: String,
    pub filename: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_map_to_columns() {
        for (label, column) in [
            ("Full Text", "fullText"),
            ("Half Text", "halfText"),
            ("Small Text", "smallText"),
            ("Bullets", "bullets"),
        ] {
            let variant = Variant::from_label(label).unwrap();
            assert_eq!(variant.column(), column);
        }
    }

    #[test]
    fn unknown_label_is_rejected() {
        assert_eq!(Variant::from_label("Medium Text"), None);
        assert_eq!(Variant::from_label("full"), None);
    }

    #[test]
    fn cli_names_resolve() {
        assert_eq!(Variant::from_name("half"), Some(Variant::Half));
        assert_eq!(Variant::from_name("Half"), None);
    }
}
