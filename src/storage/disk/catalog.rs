use std::collections::BTreeMap;

use crate::common::{
    Result, StrataError, CATALOG_ENTRY_SIZE, CATALOG_HEADER_SIZE, CATALOG_MAGIC,
    TABLE_NAME_MAX_LEN,
};

/// One 40-byte catalog record: explicit name length, the name
/// zero-padded to 32 bytes, and the table's file id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub name: String,
    pub file_id: u32,
}

impl CatalogEntry {
    pub fn serialize(&self) -> Vec<u8> {
        let mut data = vec![0u8; CATALOG_ENTRY_SIZE];
        let name = self.name.as_bytes();
        data[..4].copy_from_slice(&(name.len() as u32).to_be_bytes());
        data[4..4 + name.len()].copy_from_slice(name);
        data[36..40].copy_from_slice(&self.file_id.to_be_bytes());
        data
    }

    pub fn deserialize(data: &[u8]) -> Result<Self> {
        if data.len() < CATALOG_ENTRY_SIZE {
            return Err(StrataError::InsufficientData("catalog entry"));
        }

        let name_len = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as usize;
        if name_len > TABLE_NAME_MAX_LEN {
            return Err(StrataError::InvalidLength("catalog entry name"));
        }

        // The explicit length field is authoritative, not the padding.
        let name = String::from_utf8_lossy(&data[4..4 + name_len]).into_owned();
        let file_id = u32::from_be_bytes([data[36], data[37], data[38], data[39]]);

        Ok(Self { name, file_id })
    }
}

/// The global list of known tables: the catalog file's in-memory form.
///
/// A `BTreeMap` keeps serialization deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableCatalog {
    pub tables: BTreeMap<String, u32>,
}

impl TableCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Serializes the 4-byte magic header followed by one record per
    /// table.
    pub fn serialize(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(
            CATALOG_HEADER_SIZE + self.tables.len() * CATALOG_ENTRY_SIZE,
        );
        data.extend_from_slice(&CATALOG_MAGIC.to_be_bytes());
        for (name, &file_id) in &self.tables {
            let entry = CatalogEntry {
                name: name.clone(),
                file_id,
            };
            data.extend_from_slice(&entry.serialize());
        }
        data
    }

    pub fn deserialize(data: &[u8]) -> Result<Self> {
        if data.len() < CATALOG_HEADER_SIZE {
            return Err(StrataError::InsufficientData("catalog header"));
        }
        let magic = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
        if magic != CATALOG_MAGIC {
            return Err(StrataError::InvalidMagic("catalog"));
        }

        let mut tables = BTreeMap::new();
        let entries = &data[CATALOG_HEADER_SIZE..];
        for chunk in entries.chunks_exact(CATALOG_ENTRY_SIZE) {
            let entry = CatalogEntry::deserialize(chunk)?;
            tables.insert(entry.name, entry.file_id);
        }

        Ok(Self { tables })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_catalog_roundtrip() {
        let catalog = TableCatalog::new();
        let bytes = catalog.serialize();
        assert_eq!(bytes.len(), CATALOG_HEADER_SIZE);

        let recovered = TableCatalog::deserialize(&bytes).unwrap();
        assert!(recovered.is_empty());
    }

    #[test]
    fn test_catalog_roundtrip() {
        let mut catalog = TableCatalog::new();
        catalog.tables.insert("users".into(), 1);
        catalog.tables.insert("orders".into(), 2);

        let bytes = catalog.serialize();
        assert_eq!(bytes.len(), CATALOG_HEADER_SIZE + 2 * CATALOG_ENTRY_SIZE);

        let recovered = TableCatalog::deserialize(&bytes).unwrap();
        assert_eq!(recovered, catalog);
    }

    #[test]
    fn test_catalog_bad_magic() {
        let mut bytes = TableCatalog::new().serialize();
        bytes[0] ^= 0xFF;
        assert!(matches!(
            TableCatalog::deserialize(&bytes),
            Err(StrataError::InvalidMagic("catalog"))
        ));
    }

    #[test]
    fn test_entry_name_is_zero_padded() {
        let entry = CatalogEntry {
            name: "t".into(),
            file_id: 9,
        };
        let bytes = entry.serialize();
        assert_eq!(bytes.len(), CATALOG_ENTRY_SIZE);
        assert_eq!(&bytes[..4], &1u32.to_be_bytes());
        assert_eq!(bytes[4], b't');
        assert!(bytes[5..36].iter().all(|&b| b == 0));
        assert_eq!(&bytes[36..40], &9u32.to_be_bytes());
    }

    #[test]
    fn test_entry_rejects_oversized_name_length() {
        let mut bytes = CatalogEntry {
            name: "t".into(),
            file_id: 1,
        }
        .serialize();
        bytes[..4].copy_from_slice(&33u32.to_be_bytes());
        assert!(matches!(
            CatalogEntry::deserialize(&bytes),
            Err(StrataError::InvalidLength(_))
        ));
    }
}
