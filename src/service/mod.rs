pub mod address_deriver;
pub mod device_transport;
pub mod ledger_wallet;
pub mod message_signer;
pub mod network_client;
pub mod notifier;
pub mod signing_wallet;
pub mod transaction_signer;

#[cfg(test)]
pub(crate) mod test_support;

pub use ledger_wallet::{LedgerWallet, LedgerWalletBuilder};
pub use signing_wallet::SigningWallet;
