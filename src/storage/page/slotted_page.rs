use crate::common::{
    PageId, Result, StrataError, PAGE_HEADER_SIZE, PAGE_SIZE, SLOT_SIZE,
};
use crate::tuple::{row_to_tuple, tuple_to_row, Column, RawTuple, Row};

/// Slotted page layout (4096 bytes, all integers big-endian):
///
/// ```text
/// +--------------------+ 0
/// | Page Header (16 B) |   page_id | record_count | lower | upper
/// +--------------------+ 16
/// | Slot Array         |   12 B per slot, grows downward
/// +--------------------+ lower
/// | Free Space         |
/// +--------------------+ upper
/// | Tuple Data         |   packed upward from the page end
/// +--------------------+ 4096
/// ```
///
/// Slot `i` points at tuple `i`; `free_space = upper - lower`.
/// Flags on a slot tombstone the tuple without reclaiming its bytes.
pub const SLOT_ACTIVE: u32 = 0;
pub const SLOT_DELETED: u32 = 1;

/// Fixed 16-byte page header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageHeader {
    pub page_id: u32,
    pub record_count: u32,
    /// First free byte after the slot array.
    pub lower: u32,
    /// First byte of the lowest tuple.
    pub upper: u32,
}

impl PageHeader {
    pub fn new(page_id: u32) -> Self {
        Self {
            page_id,
            record_count: 0,
            lower: PAGE_HEADER_SIZE as u32,
            upper: PAGE_SIZE as u32,
        }
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(PAGE_HEADER_SIZE);
        data.extend_from_slice(&self.page_id.to_be_bytes());
        data.extend_from_slice(&self.record_count.to_be_bytes());
        data.extend_from_slice(&self.lower.to_be_bytes());
        data.extend_from_slice(&self.upper.to_be_bytes());
        data
    }

    pub fn deserialize(data: &[u8]) -> Result<Self> {
        if data.len() < PAGE_HEADER_SIZE {
            return Err(StrataError::InsufficientData("page header"));
        }
        let header = Self {
            page_id: u32::from_be_bytes([data[0], data[1], data[2], data[3]]),
            record_count: u32::from_be_bytes([data[4], data[5], data[6], data[7]]),
            lower: u32::from_be_bytes([data[8], data[9], data[10], data[11]]),
            upper: u32::from_be_bytes([data[12], data[13], data[14], data[15]]),
        };
        if header.lower > header.upper
            || header.upper > PAGE_SIZE as u32
            || header.lower < PAGE_HEADER_SIZE as u32
        {
            return Err(StrataError::InvalidLength("page header"));
        }
        Ok(header)
    }
}

/// One 12-byte slot array entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSlot {
    pub offset: u32,
    pub length: u32,
    pub flags: u32,
}

impl PageSlot {
    pub fn is_deleted(&self) -> bool {
        self.flags == SLOT_DELETED
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(SLOT_SIZE);
        data.extend_from_slice(&self.offset.to_be_bytes());
        data.extend_from_slice(&self.length.to_be_bytes());
        data.extend_from_slice(&self.flags.to_be_bytes());
        data
    }

    pub fn deserialize(data: &[u8]) -> Result<Self> {
        if data.len() < SLOT_SIZE {
            return Err(StrataError::InsufficientData("page slot"));
        }
        Ok(Self {
            offset: u32::from_be_bytes([data[0], data[1], data[2], data[3]]),
            length: u32::from_be_bytes([data[4], data[5], data[6], data[7]]),
            flags: u32::from_be_bytes([data[8], data[9], data[10], data[11]]),
        })
    }
}

/// A page in its wire form: header, slots and raw tuples, without any
/// schema applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPage {
    pub header: PageHeader,
    pub slots: Vec<PageSlot>,
    pub tuples: Vec<RawTuple>,
}

impl RawPage {
    /// Creates an empty page with the given id.
    pub fn new(page_id: PageId) -> Self {
        Self {
            header: PageHeader::new(page_id.as_u32()),
            slots: Vec::new(),
            tuples: Vec::new(),
        }
    }

    /// Encodes the page into exactly `PAGE_SIZE` bytes. Bytes between
    /// `lower` and `upper` are zeroed.
    pub fn serialize(&self) -> Vec<u8> {
        let mut data = vec![0u8; PAGE_SIZE];

        data[..PAGE_HEADER_SIZE].copy_from_slice(&self.header.serialize());

        for (i, slot) in self.slots.iter().enumerate() {
            let start = PAGE_HEADER_SIZE + i * SLOT_SIZE;
            data[start..start + SLOT_SIZE].copy_from_slice(&slot.serialize());
        }

        for (slot, tuple) in self.slots.iter().zip(&self.tuples) {
            let start = slot.offset as usize;
            let end = start + slot.length as usize;
            data[start..end].copy_from_slice(&tuple.serialize());
        }

        data
    }

    /// Decodes a page from exactly `PAGE_SIZE` bytes, validating the
    /// header and every slot extent before reading tuples.
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        if data.len() < PAGE_SIZE {
            return Err(StrataError::InsufficientData("page"));
        }

        let header = PageHeader::deserialize(&data[..PAGE_HEADER_SIZE])?;

        let slot_area_end = PAGE_HEADER_SIZE + header.record_count as usize * SLOT_SIZE;
        if slot_area_end > PAGE_SIZE {
            return Err(StrataError::InsufficientData("slot array"));
        }

        let mut slots = Vec::with_capacity(header.record_count as usize);
        for i in 0..header.record_count as usize {
            let start = PAGE_HEADER_SIZE + i * SLOT_SIZE;
            slots.push(PageSlot::deserialize(&data[start..start + SLOT_SIZE])?);
        }

        let mut tuples = Vec::with_capacity(slots.len());
        for slot in &slots {
            let start = slot.offset as usize;
            let end = start + slot.length as usize;
            if end > PAGE_SIZE {
                return Err(StrataError::InsufficientData("tuple"));
            }
            if start < header.upper as usize {
                return Err(StrataError::InvalidLength("slot offset"));
            }
            tuples.push(RawTuple::deserialize(&data[start..end])?);
        }

        Ok(Self {
            header,
            slots,
            tuples,
        })
    }
}

/// A page decoded against a table schema: raw tuples turned into rows.
///
/// This is the form buffer frames hold and the executor works with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub header: PageHeader,
    pub slots: Vec<PageSlot>,
    pub rows: Vec<Row>,
    pub columns: Vec<Column>,
}

impl Page {
    /// Creates an empty page for a table with the given schema.
    pub fn new(page_id: PageId, columns: Vec<Column>) -> Self {
        Self {
            header: PageHeader::new(page_id.as_u32()),
            slots: Vec::new(),
            rows: Vec::new(),
            columns,
        }
    }

    /// Decodes every tuple of a raw page using the table's columns.
    pub fn from_raw(raw: RawPage, columns: Vec<Column>) -> Result<Self> {
        let mut rows = Vec::with_capacity(raw.tuples.len());
        for tuple in &raw.tuples {
            rows.push(tuple_to_row(tuple, &columns)?);
        }
        Ok(Self {
            header: raw.header,
            slots: raw.slots,
            rows,
            columns,
        })
    }

    /// Re-encodes the rows into their wire form for writing to disk.
    pub fn to_raw(&self) -> Result<RawPage> {
        let mut tuples = Vec::with_capacity(self.rows.len());
        for row in &self.rows {
            tuples.push(row_to_tuple(row)?);
        }
        Ok(RawPage {
            header: self.header,
            slots: self.slots.clone(),
            tuples,
        })
    }

    pub fn page_id(&self) -> PageId {
        PageId::new(self.header.page_id)
    }

    pub fn record_count(&self) -> u32 {
        self.header.record_count
    }

    /// Bytes left between the slot array and the tuple area.
    pub fn free_space(&self) -> usize {
        (self.header.upper - self.header.lower) as usize
    }

    /// Whether a tuple of `tuple_size` bytes plus its slot fits.
    pub fn can_insert(&self, tuple_size: usize) -> bool {
        self.free_space() >= tuple_size + SLOT_SIZE
    }

    /// Appends a row, packing its tuple downward from `upper` and its
    /// slot upward after the header. Returns the new slot index.
    pub fn insert_row(&mut self, row: Row) -> Result<usize> {
        let tuple = row_to_tuple(&row)?;
        let tuple_size = tuple.length as usize;

        if !self.can_insert(tuple_size) {
            return Err(StrataError::PageOverflow {
                tuple_size,
                available: self.free_space().saturating_sub(SLOT_SIZE),
            });
        }

        let offset = self.header.upper - tuple.length;
        self.slots.push(PageSlot {
            offset,
            length: tuple.length,
            flags: SLOT_ACTIVE,
        });
        self.rows.push(row);

        self.header.upper = offset;
        self.header.lower += SLOT_SIZE as u32;
        self.header.record_count += 1;

        Ok(self.slots.len() - 1)
    }

    /// Tombstones a slot. The tuple bytes stay where they are.
    pub fn delete_row(&mut self, slot: usize) -> Result<()> {
        match self.slots.get_mut(slot) {
            Some(entry) => {
                entry.flags = SLOT_DELETED;
                Ok(())
            }
            None => Err(StrataError::InvalidLength("slot index")),
        }
    }

    /// Iterates rows whose slot has not been tombstoned.
    pub fn live_rows(&self) -> impl Iterator<Item = &Row> {
        self.slots
            .iter()
            .zip(&self.rows)
            .filter(|(slot, _)| !slot.is_deleted())
            .map(|(_, row)| row)
    }
}

#[cfg(test)]
mod tests {
    use crate::tuple::{DataType, Value};

    use super::*;

    fn columns() -> Vec<Column> {
        vec![
            Column::new("id", DataType::Int32),
            Column::new("name", DataType::Text),
        ]
    }

    fn row(id: i32, name: &str) -> Row {
        vec![Value::Int32(id), Value::Text(name.into())]
    }

    #[test]
    fn test_fresh_page_header() {
        let page = Page::new(PageId::new(1), columns());
        assert_eq!(page.header.page_id, 1);
        assert_eq!(page.header.record_count, 0);
        assert_eq!(page.header.lower, PAGE_HEADER_SIZE as u32);
        assert_eq!(page.header.upper, PAGE_SIZE as u32);
        assert_eq!(page.free_space(), PAGE_SIZE - PAGE_HEADER_SIZE);
    }

    #[test]
    fn test_insert_updates_header() {
        let mut page = Page::new(PageId::new(1), columns());
        let slot = page.insert_row(row(1, "ada")).unwrap();

        assert_eq!(slot, 0);
        assert_eq!(page.header.record_count, 1);
        assert_eq!(page.header.lower, (PAGE_HEADER_SIZE + SLOT_SIZE) as u32);

        let tuple_len = page.slots[0].length;
        assert_eq!(page.header.upper, PAGE_SIZE as u32 - tuple_len);
        assert_eq!(page.slots[0].offset, page.header.upper);
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let mut page = Page::new(PageId::new(3), columns());
        page.insert_row(row(1, "ada")).unwrap();
        page.insert_row(row(2, "grace")).unwrap();
        page.insert_row(vec![Value::Int32(3), Value::Null]).unwrap();

        let raw = page.to_raw().unwrap();
        let bytes = raw.serialize();
        assert_eq!(bytes.len(), PAGE_SIZE);

        let decoded = RawPage::deserialize(&bytes).unwrap();
        assert_eq!(decoded, raw);

        let recovered = Page::from_raw(decoded, columns()).unwrap();
        assert_eq!(recovered, page);
    }

    #[test]
    fn test_slot_extents_do_not_overlap() {
        let mut page = Page::new(PageId::new(1), columns());
        for i in 0..10 {
            page.insert_row(row(i, "xyz")).unwrap();
        }

        let mut extents: Vec<_> = page
            .slots
            .iter()
            .map(|s| (s.offset, s.offset + s.length))
            .collect();
        extents.sort();
        for pair in extents.windows(2) {
            assert!(pair[0].1 <= pair[1].0);
            assert!(pair[0].0 >= page.header.upper);
        }
    }

    #[test]
    fn test_page_overflow() {
        let mut page = Page::new(PageId::new(1), columns());
        let big = "x".repeat(1000);

        let mut inserted = 0;
        while page.can_insert(8 + 1 + 4 + 4 + big.len()) {
            page.insert_row(row(inserted, &big)).unwrap();
            inserted += 1;
        }

        assert!(inserted > 0);
        let result = page.insert_row(row(99, &big));
        assert!(matches!(result, Err(StrataError::PageOverflow { .. })));
        // A failed insert must leave the header untouched.
        assert_eq!(page.header.record_count, inserted as u32);
    }

    #[test]
    fn test_tombstone_keeps_bytes() {
        let mut page = Page::new(PageId::new(1), columns());
        page.insert_row(row(1, "a")).unwrap();
        page.insert_row(row(2, "b")).unwrap();

        let free_before = page.free_space();
        page.delete_row(0).unwrap();

        assert_eq!(page.free_space(), free_before);
        assert_eq!(page.record_count(), 2);
        let live: Vec<_> = page.live_rows().collect();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0][0], Value::Int32(2));
    }

    #[test]
    fn test_tombstone_survives_roundtrip() {
        let mut page = Page::new(PageId::new(1), columns());
        page.insert_row(row(1, "a")).unwrap();
        page.insert_row(row(2, "b")).unwrap();
        page.delete_row(1).unwrap();

        let bytes = page.to_raw().unwrap().serialize();
        let recovered =
            Page::from_raw(RawPage::deserialize(&bytes).unwrap(), columns()).unwrap();

        assert!(recovered.slots[1].is_deleted());
        assert_eq!(recovered.live_rows().count(), 1);
    }

    #[test]
    fn test_delete_out_of_range() {
        let mut page = Page::new(PageId::new(1), columns());
        assert!(page.delete_row(0).is_err());
    }

    #[test]
    fn test_deserialize_short_buffer() {
        assert!(matches!(
            RawPage::deserialize(&[0u8; 100]),
            Err(StrataError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_deserialize_corrupt_header() {
        let mut bytes = RawPage::new(PageId::new(1)).serialize();
        // lower > upper
        bytes[8..12].copy_from_slice(&5000u32.to_be_bytes());
        assert!(matches!(
            RawPage::deserialize(&bytes),
            Err(StrataError::InvalidLength(_))
        ));
    }

    #[test]
    fn test_deserialize_slot_beyond_page() {
        let mut page = Page::new(PageId::new(1), columns());
        page.insert_row(row(1, "a")).unwrap();
        let mut bytes = page.to_raw().unwrap().serialize();

        // Point slot 0 past the end of the page.
        bytes[PAGE_HEADER_SIZE..PAGE_HEADER_SIZE + 4]
            .copy_from_slice(&(PAGE_SIZE as u32 - 2).to_be_bytes());
        assert!(matches!(
            RawPage::deserialize(&bytes),
            Err(StrataError::InsufficientData(_))
        ));
    }
}
