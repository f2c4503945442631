use std::{fs::File, io::BufReader, path::Path};

use serde::Serialize as _;

use crate::{
    catalog::model::Catalog,
    foundation::error::{CocoAugError, CocoAugResult},
    foundation::fsio,
};

const INDENT: &[u8] = b"    ";

impl Catalog {
    /// Parse a catalog from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> CocoAugResult<Self> {
        serde_json::from_reader(r)
            .map_err(|e| CocoAugError::configuration(format!("parse catalog JSON: {e}")))
    }

    /// Parse a catalog from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> CocoAugResult<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(CocoAugError::configuration(format!(
                "catalog file does not exist: '{}'",
                path.display()
            )));
        }
        let f = File::open(path).map_err(|e| {
            CocoAugError::configuration(format!("open catalog JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f)).map_err(|e| match e {
            CocoAugError::Configuration(msg) => {
                CocoAugError::configuration(format!("{msg} ('{}')", path.display()))
            }
            other => other,
        })
    }

    /// Serialize with 4-space indentation.
    pub fn to_json_bytes(&self) -> CocoAugResult<Vec<u8>> {
        let mut buf = Vec::new();
        let fmt = serde_json::ser::PrettyFormatter::with_indent(INDENT);
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, fmt);
        self.serialize(&mut ser)
            .map_err(|e| CocoAugError::serde(format!("serialize catalog: {e}")))?;
        Ok(buf)
    }

    /// Replace the file at `path` with this catalog, creating parent directories.
    pub fn write_to_path(&self, path: impl AsRef<Path>) -> CocoAugResult<()> {
        let bytes = self.to_json_bytes()?;
        fsio::replace_file(path.as_ref(), &bytes)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/catalog/store.rs"]
mod tests;
