#![forbid(unsafe_code)]

pub mod bank;
pub mod repository;

pub use bank::{BankLoadError, load_bank, parse_bank};
pub use repository::{
    HistoryRepository, InMemoryRepository, SessionSummaryId, SessionSummaryRepository,
    SessionSummaryRow, Storage, StorageError,
};
