//! Wallet connection for the simulated session

use log::{info, warn};

use crate::config::NetworkConfig;

/// Address used when no keypair is available
pub const DEMO_WALLET: &str = "DemoWallet7...3x9";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wallet {
    pub address: String,
    pub demo: bool,
}

impl Wallet {
    /// Connect with the configured keypair, or as the demo user if there is none
    pub fn connect(config: &NetworkConfig) -> Wallet {
        match config.pubkey() {
            Some(pubkey) => {
                info!("connected wallet {}", pubkey);
                Wallet {
                    address: pubkey.to_string(),
                    demo: false,
                }
            }
            None => {
                warn!(
                    "no keypair at {}; logging in as demo user",
                    config.keypair_path.display()
                );
                Wallet::demo()
            }
        }
    }

    pub fn demo() -> Wallet {
        Wallet {
            address: DEMO_WALLET.to_string(),
            demo: true,
        }
    }
}
