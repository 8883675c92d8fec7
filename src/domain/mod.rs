pub mod transaction;

pub use transaction::{Cryptocurrency, NewTransaction, Transaction, TransactionStatus, UnknownVariant};
