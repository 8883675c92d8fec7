pub mod price_feed;
pub mod wallet;

pub use price_feed::{MockPriceFeed, PriceFeed, PriceQuote};
pub use wallet::{MockWallet, TransferRequest, WalletAdapter, WalletError};
