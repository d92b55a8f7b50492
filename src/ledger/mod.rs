mod load;
mod parse;
mod record;

pub use load::{LoadedFile, load_bytes, load_file};
pub use record::TransactionRecord;
