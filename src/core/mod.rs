pub mod csv_export;
pub mod csv_import;
pub mod field_parsers;
pub mod importer;
pub mod service;
pub mod xml_export;
pub mod xml_import;

pub use crate::domain::model::{ContactRecord, ImportOutcome, NewCard, StoredCard};
pub use crate::domain::ports::{CardRepository, ConfigProvider, Storage};
pub use crate::utils::error::Result;
