//! Solana RPC client utilities and helpers

use anyhow::{Context, Result};
use colored::Colorize;
use log::debug;
use solana_client::rpc_client::RpcClient;
use solana_sdk::{
    commitment_config::CommitmentConfig,
    instruction::Instruction,
    native_token::LAMPORTS_PER_SOL,
    pubkey::Pubkey,
    signature::{Signature, Signer},
    transaction::Transaction,
};

use crate::config::NetworkConfig;

/// Create an RPC client from the network configuration
pub fn create_rpc_client(config: &NetworkConfig) -> RpcClient {
    RpcClient::new_with_commitment(
        config.rpc_url.clone(),
        CommitmentConfig::confirmed(),
    )
}

/// Send and confirm a transaction signed by the configured keypair
pub async fn send_and_confirm_transaction(
    config: &NetworkConfig,
    instructions: Vec<Instruction>,
) -> Result<Signature> {
    let payer = config.signer()?;
    let client = create_rpc_client(config);

    let recent_blockhash = client
        .get_latest_blockhash()
        .context("Failed to get recent blockhash")?;

    let mut transaction = Transaction::new_with_payer(
        &instructions,
        Some(&payer.pubkey()),
    );

    transaction.sign(&[payer], recent_blockhash);

    println!("{}", "Sending transaction...".dimmed());
    debug!("submitting {} instruction(s) to {}", instructions.len(), config.rpc_url);

    let signature = client
        .send_and_confirm_transaction(&transaction)
        .context("Failed to send and confirm transaction")?;

    println!("{} {}", "Transaction confirmed:".bright_green(), signature);

    Ok(signature)
}

/// Get account data
pub fn get_account_data(
    config: &NetworkConfig,
    address: &Pubkey,
) -> Result<Vec<u8>> {
    let client = create_rpc_client(config);

    let account = client
        .get_account(address)
        .with_context(|| format!("Failed to get account: {}", address))?;

    if account.owner != config.program_id {
        anyhow::bail!(
            "Account is not owned by the Solcasts program.\nExpected: {}\nActual: {}",
            config.program_id,
            account.owner
        );
    }

    Ok(account.data)
}

/// Get SOL balance
pub fn get_balance(config: &NetworkConfig, address: &Pubkey) -> Result<u64> {
    let client = create_rpc_client(config);

    client
        .get_balance(address)
        .with_context(|| format!("Failed to get balance for: {}", address))
}

/// Format lamports as SOL
pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / LAMPORTS_PER_SOL as f64
}

/// Parse SOL to lamports, rounded to the nearest lamport
pub fn sol_to_lamports(sol: f64) -> Result<u64> {
    if !sol.is_finite() || sol <= 0.0 {
        anyhow::bail!("Amount must be a positive number of SOL, got {}", sol);
    }
    let lamports = (sol * LAMPORTS_PER_SOL as f64).round();
    if lamports < 1.0 {
        anyhow::bail!("Amount {} SOL is less than one lamport", sol);
    }
    if lamports >= u64::MAX as f64 {
        anyhow::bail!("Amount {} SOL exceeds the lamport range", sol);
    }
    Ok(lamports as u64)
}

fn shorten(value: &str) -> String {
    format!("{}...{}", &value[..8], &value[value.len() - 8..])
}

/// Shortened signature with an explorer link for the configured cluster
pub fn format_signature(signature: &Signature, config: &NetworkConfig) -> String {
    let sig_str = signature.to_string();
    let base = format!("https://explorer.solana.com/tx/{}", sig_str);

    let explorer_url = match config.network.as_str() {
        "mainnet-beta" | "mainnet" => base,
        "devnet" => format!("{}?cluster=devnet", base),
        _ => format!("{}?cluster=custom&customUrl={}", base, config.rpc_url),
    };

    format!("{} ({})", shorten(&sig_str).bright_blue(), explorer_url.dimmed())
}

/// Shortened address for headings
pub fn format_pubkey(pubkey: &Pubkey) -> String {
    shorten(&pubkey.to_string()).bright_yellow().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sol_conversions() {
        assert_eq!(sol_to_lamports(1.5).unwrap(), 1_500_000_000);
        assert_eq!(sol_to_lamports(1.001).unwrap(), 1_001_000_000);
        assert_eq!(sol_to_lamports(0.3).unwrap(), 300_000_000);
        assert_eq!(sol_to_lamports(1e-9).unwrap(), 1);
        assert!(sol_to_lamports(1e-12).is_err());
        assert!(sol_to_lamports(1e12).is_err());
        assert!(sol_to_lamports(0.0).is_err());
        assert!(sol_to_lamports(f64::NAN).is_err());
        assert_eq!(lamports_to_sol(250_000_000), 0.25);
    }

    #[test]
    fn test_sol_amounts_round_trip_to_the_lamport() {
        for millis in 1..20_000u64 {
            let sol = millis as f64 / 1000.0;
            assert_eq!(sol_to_lamports(sol).unwrap(), millis * 1_000_000, "{} SOL", sol);
        }
    }

    #[test]
    fn test_format_signature_links_cluster() {
        let dir = tempfile::tempdir().unwrap();
        let keypair = Some(dir.path().join("none.json"));

        let devnet = NetworkConfig::new("devnet", None, keypair.clone(), None).unwrap();
        assert!(format_signature(&Signature::default(), &devnet).contains("cluster=devnet"));

        let local = NetworkConfig::new("localnet", None, keypair, None).unwrap();
        let formatted = format_signature(&Signature::default(), &local);
        assert!(formatted.contains("customUrl=http://127.0.0.1:8899"));
    }
}
