pub mod columns;
pub mod deserializers;
pub mod pipeline;
pub mod types;

pub use deserializers::parse_flexible_date;
pub use pipeline::{
    parse_csv, parse_csv_reader, parse_csv_with_config, parse_json_rows, parse_rows, ParseOutput,
};
pub use types::{ParseWarning, RawRow, ServiceRecord};
