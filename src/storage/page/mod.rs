mod slotted_page;

pub use slotted_page::{
    Page, PageHeader, PageSlot, RawPage, SLOT_ACTIVE, SLOT_DELETED,
};
