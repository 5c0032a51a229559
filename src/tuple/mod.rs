mod data_type;
mod schema;
mod tuple;
mod value;

pub use data_type::DataType;
pub use schema::{null_bitmap_size, Column, Schema};
pub use tuple::{row_to_tuple, tuple_to_row, RawTuple, Row};
pub use value::Value;
