//! Network configuration, keypair management and session settings

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use solana_sdk::{
    pubkey,
    pubkey::Pubkey,
    signature::{Keypair, Signer},
};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::market::UserProfile;

/// Default Solcasts program id; override with `--program-id` for other deployments
pub const SOLCASTS_PROGRAM_ID: Pubkey = pubkey!("7Cxi59WJwm6BC5pt3mKamv8uvHHmn77LV5pvnwMjVTdZ");

pub struct NetworkConfig {
    pub network: String,
    pub rpc_url: String,
    pub ws_url: String,
    pub keypair: Option<Keypair>,
    pub keypair_path: PathBuf,
    pub program_id: Pubkey,
}

impl NetworkConfig {
    pub fn new(
        network: &str,
        rpc_url: Option<String>,
        keypair_path: Option<PathBuf>,
        program_id: Option<String>,
    ) -> Result<Self> {
        let (default_rpc, ws_url) = network_urls(network)?;
        let rpc_url = rpc_url.unwrap_or(default_rpc);

        let program_id = match program_id {
            Some(value) => Pubkey::from_str(&value)
                .with_context(|| format!("Invalid program id: {}", value))?,
            None => SOLCASTS_PROGRAM_ID,
        };

        let keypair_path = match keypair_path {
            Some(path) => expand_path(&path),
            None => default_keypair_path()?,
        };

        // A missing keypair is not an error: the session falls back to the demo wallet
        let keypair = if keypair_path.exists() {
            Some(load_keypair(&keypair_path)?)
        } else {
            debug!("no keypair at {}", keypair_path.display());
            None
        };

        Ok(Self {
            network: network.to_string(),
            rpc_url,
            ws_url,
            keypair,
            keypair_path,
            program_id,
        })
    }

    pub fn pubkey(&self) -> Option<Pubkey> {
        self.keypair.as_ref().map(|kp| kp.pubkey())
    }

    /// The signing keypair, required for anything that submits a transaction
    pub fn signer(&self) -> Result<&Keypair> {
        self.keypair.as_ref().with_context(|| {
            format!(
                "Keypair file not found: {}\n\
                 Create one with: solana-keygen new --outfile {}",
                self.keypair_path.display(),
                self.keypair_path.display()
            )
        })
    }
}

fn network_urls(network: &str) -> Result<(String, String)> {
    let urls = match network {
        "localnet" | "local" => (
            "http://127.0.0.1:8899".to_string(),
            "ws://127.0.0.1:8900".to_string(),
        ),
        "devnet" => (
            "https://api.devnet.solana.com".to_string(),
            "wss://api.devnet.solana.com".to_string(),
        ),
        "mainnet-beta" | "mainnet" => (
            "https://api.mainnet-beta.solana.com".to_string(),
            "wss://api.mainnet-beta.solana.com".to_string(),
        ),
        _ => anyhow::bail!("Unknown network: {}. Use localnet, devnet, or mainnet-beta", network),
    };
    Ok(urls)
}

/// Keypair from the Solana CLI config if there is one, else `~/.config/solana/id.json`
fn default_keypair_path() -> Result<PathBuf> {
    if let Some(config_file) = solana_cli_config::CONFIG_FILE.as_ref() {
        if let Ok(cli_config) = solana_cli_config::Config::load(config_file) {
            return Ok(expand_path(Path::new(&cli_config.keypair_path)));
        }
    }

    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config/solana/id.json"))
}

fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(&raw).into_owned())
}

/// Load a keypair from a JSON file
fn load_keypair(path: &Path) -> Result<Keypair> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read keypair file: {}", path.display()))?;

    let bytes: Vec<u8> = serde_json::from_str(&data)
        .with_context(|| format!("Failed to parse keypair JSON: {}", path.display()))?;

    Keypair::from_bytes(&bytes)
        .with_context(|| format!("Invalid keypair data in: {}", path.display()))
}

/// Simulated network delay per store operation, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LatencyConfig {
    pub fetch_ms: u64,
    pub create_ms: u64,
    pub buy_ms: u64,
    pub resolve_ms: u64,
    pub transfer_ms: u64,
}

impl LatencyConfig {
    pub fn zero() -> Self {
        Self {
            fetch_ms: 0,
            create_ms: 0,
            buy_ms: 0,
            resolve_ms: 0,
            transfer_ms: 0,
        }
    }
}

impl Default for LatencyConfig {
    fn default() -> Self {
        Self {
            fetch_ms: 800,
            create_ms: 2000,
            buy_ms: 0,
            resolve_ms: 1500,
            transfer_ms: 1000,
        }
    }
}

/// Starting state of a simulated session, loadable from TOML
///
/// ```toml
/// starting_balance = 5.0
/// seed_markets = false
///
/// [latency]
/// create_ms = 0
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub starting_balance: f64,
    pub seed_markets: bool,
    pub profile: UserProfile,
    pub latency: LatencyConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            starting_balance: 14.2,
            seed_markets: true,
            profile: UserProfile::default(),
            latency: LatencyConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Defaults when no file is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let path = expand_path(path);

        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read session config: {}", path.display()))?;
        let config: SessionConfig = toml::from_str(&data)
            .with_context(|| format!("Failed to parse session config: {}", path.display()))?;

        if !config.starting_balance.is_finite() || config.starting_balance < 0.0 {
            anyhow::bail!("starting_balance must be a non-negative number");
        }
        debug!("loaded session config from {}", path.display());
        Ok(config)
    }

    /// Same session without simulated delays
    pub fn without_latency(mut self) -> Self {
        self.latency = LatencyConfig::zero();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_network_urls() {
        let (rpc, ws) = network_urls("devnet").unwrap();
        assert_eq!(rpc, "https://api.devnet.solana.com");
        assert_eq!(ws, "wss://api.devnet.solana.com");
        assert!(network_urls("local").unwrap().0.contains("127.0.0.1"));
        assert!(network_urls("testnet-9").is_err());
    }

    #[test]
    fn test_missing_keypair_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = NetworkConfig::new(
            "localnet",
            Some("http://example:8899".to_string()),
            Some(dir.path().join("missing.json")),
            None,
        )
        .unwrap();

        assert!(config.keypair.is_none());
        assert!(config.pubkey().is_none());
        assert!(config.signer().is_err());
        assert_eq!(config.rpc_url, "http://example:8899");
        assert_eq!(config.program_id, SOLCASTS_PROGRAM_ID);
    }

    #[test]
    fn test_program_id_override() {
        let dir = tempfile::tempdir().unwrap();
        let keypair = dir.path().join("none.json");
        let program = Pubkey::new_unique();

        let config = NetworkConfig::new("localnet", None, Some(keypair.clone()), Some(program.to_string())).unwrap();
        assert_eq!(config.program_id, program);

        assert!(NetworkConfig::new("localnet", None, Some(keypair), Some("not-a-key".to_string())).is_err());
    }

    #[test]
    fn test_keypair_loaded_from_json() {
        let keypair = Keypair::new();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", serde_json::to_string(&keypair.to_bytes().to_vec()).unwrap()).unwrap();

        let config = NetworkConfig::new("devnet", None, Some(file.path().to_path_buf()), None).unwrap();
        assert_eq!(config.pubkey(), Some(keypair.pubkey()));
    }

    #[test]
    fn test_session_defaults_match_demo_session() {
        let config = SessionConfig::load(None).unwrap();
        assert_eq!(config.starting_balance, 14.2);
        assert!(config.seed_markets);
        assert_eq!(config.profile.total_deposited, 20.0);
        assert_eq!(config.latency.create_ms, 2000);
    }

    #[test]
    fn test_session_partial_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "starting_balance = 5.0\nseed_markets = false\n\n[latency]\ncreate_ms = 10").unwrap();

        let config = SessionConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.starting_balance, 5.0);
        assert!(!config.seed_markets);
        assert_eq!(config.latency.create_ms, 10);
        // Untouched fields keep their defaults
        assert_eq!(config.latency.fetch_ms, 800);
        assert_eq!(config.profile.total_volume, 45.5);
    }

    #[test]
    fn test_session_partial_profile() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[profile]\nrealized_pnl = 0.0").unwrap();

        let config = SessionConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.profile.realized_pnl, 0.0);
        assert_eq!(config.profile.total_deposited, 20.0);
        assert_eq!(config.profile.unrealized_pnl, 1.2);
        assert_eq!(config.profile.total_volume, 45.5);
        assert_eq!(config.starting_balance, 14.2);
    }

    #[test]
    fn test_session_rejects_negative_balance() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "starting_balance = -1.0").unwrap();
        assert!(SessionConfig::load(Some(file.path())).is_err());
    }
}
