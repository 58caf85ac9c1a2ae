pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::TomlConfig;

pub use adapters::{local_storage::LocalStorage, memory_repository::InMemoryCardRepository};
pub use core::{importer::CardImporter, service::CardService};
pub use domain::model::{
    CardSubmission, ContactRecord, ExportFormat, ImportFormat, ImportOutcome, NewCard, StoredCard,
    SubmissionResult,
};
pub use utils::error::{CardError, Result};
