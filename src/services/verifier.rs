use crate::{
    error::X402Error,
    models::{
        BlockchainVerification, Erc20Transfer, Log, ProjectConfig, TransactionReceipt, TxStatus,
    },
    services::{
        amount::{
            amount_tolerance, parse_amount_to_wei, tolerance_for_decimals, wei_to_token_units,
            within_tolerance, NATIVE_DECIMALS,
        },
        registry::NetworkRegistry,
        rpc::ChainRpc,
    },
};
use ethers::{
    types::{Address, H256, U256},
    utils::keccak256,
};
use std::sync::{Arc, LazyLock};

pub const TX_NOT_FOUND: &str = "Transaction not found or not yet confirmed";
pub const TX_FAILED: &str = "Transaction failed";

/// keccak256("Transfer(address,address,uint256)")
static TRANSFER_TOPIC: LazyLock<H256> =
    LazyLock::new(|| H256::from(keccak256("Transfer(address,address,uint256)")));

/// Decodes a standard ERC20 `Transfer` log. Requires the canonical event
/// signature and exactly three topics.
pub fn decode_transfer(log: &Log) -> Option<Erc20Transfer> {
    if log.topics.len() != 3 || log.topics[0] != *TRANSFER_TOPIC {
        return None;
    }
    if log.data.len() > 32 {
        return None;
    }

    Some(Erc20Transfer {
        from: Address::from(log.topics[1]),
        to: Address::from(log.topics[2]),
        value: U256::from_big_endian(log.data.as_ref()),
        token_address: log.address,
    })
}

fn is_tx_hash(raw: &str) -> bool {
    raw.strip_prefix("0x")
        .map(|digits| digits.len() == 64 && hex::decode(digits).is_ok())
        .unwrap_or(false)
}

/// What a single verification call must check.
#[derive(Debug, Clone)]
pub struct VerificationRequest<'a> {
    pub tx_hash: &'a str,
    pub project: &'a ProjectConfig,
    pub network: &'a str,
    pub amount: &'a str,
    pub token: &'a str,
    pub rpc_url: Option<&'a str>,
}

#[derive(Clone)]
pub struct PaymentVerifier {
    rpc: Arc<dyn ChainRpc>,
    registry: Arc<NetworkRegistry>,
}

impl PaymentVerifier {
    pub fn new(rpc: Arc<dyn ChainRpc>, registry: Arc<NetworkRegistry>) -> Self {
        Self { rpc, registry }
    }

    /// Never fails: every problem is reported through `valid` and `error`.
    pub async fn verify(&self, request: VerificationRequest<'_>) -> BlockchainVerification {
        match self.try_verify(&request).await {
            Ok(verification) => {
                if verification.valid {
                    tracing::info!(
                        "Payment verified: {} {} to {:?} ({})",
                        verification.amount.as_deref().unwrap_or_default(),
                        verification.token.as_deref().unwrap_or_default(),
                        request.project.pay_to,
                        self.registry
                            .network_config(request.network)
                            .tx_url(request.tx_hash.trim())
                    );
                } else {
                    tracing::debug!(
                        "Payment rejected for {}: {}",
                        request.tx_hash,
                        verification.error_message()
                    );
                }
                verification
            }
            Err(e) => {
                tracing::warn!("Verification of {} errored: {}", request.tx_hash, e);
                BlockchainVerification::failure(e.to_string())
            }
        }
    }

    async fn try_verify(
        &self,
        request: &VerificationRequest<'_>,
    ) -> Result<BlockchainVerification, X402Error> {
        let tx_hash = request.tx_hash.trim();
        if !is_tx_hash(tx_hash) {
            return Ok(BlockchainVerification::failure(format!(
                "Invalid transaction hash: {tx_hash}"
            )));
        }

        let rpc_url = self.registry.rpc_url(request.network, request.rpc_url);
        let Some(receipt) = self.rpc.transaction_receipt(&rpc_url, tx_hash).await? else {
            return Ok(BlockchainVerification::failure(TX_NOT_FOUND));
        };

        if receipt.status != TxStatus::Success {
            return Ok(BlockchainVerification::failure(TX_FAILED));
        }

        if self.registry.is_native(request.token, request.network) {
            self.verify_native(request, &receipt)
        } else {
            self.verify_erc20(request, &receipt)
        }
    }

    fn verify_native(
        &self,
        request: &VerificationRequest<'_>,
        receipt: &TransactionReceipt,
    ) -> Result<BlockchainVerification, X402Error> {
        let symbol = self
            .registry
            .network_config(request.network)
            .native_currency
            .symbol;
        let pay_to = request.project.pay_to;

        if receipt.to != Some(pay_to) {
            let actual = receipt
                .to
                .map(|to| format!("{to:?}"))
                .unwrap_or_else(|| "contract creation".to_string());
            return Ok(BlockchainVerification::failure(format!(
                "Recipient mismatch: expected {pay_to:?}, got {actual}"
            )));
        }

        let required = parse_amount_to_wei(request.amount, NATIVE_DECIMALS)?;
        if !within_tolerance(receipt.value, required, amount_tolerance()) {
            return Ok(BlockchainVerification::failure(format!(
                "Amount mismatch: expected {} {}, got {} {}",
                request.amount,
                symbol,
                wei_to_token_units(receipt.value, NATIVE_DECIMALS),
                symbol
            )));
        }

        Ok(BlockchainVerification::verified(
            format!("{:?}", receipt.transaction_hash),
            wei_to_token_units(receipt.value, NATIVE_DECIMALS),
            symbol,
            receipt.block_number,
        ))
    }

    fn verify_erc20(
        &self,
        request: &VerificationRequest<'_>,
        receipt: &TransactionReceipt,
    ) -> Result<BlockchainVerification, X402Error> {
        let Some(token) = self.registry.token_config(request.token, request.network) else {
            return Ok(BlockchainVerification::failure(format!(
                "Unknown token: {}",
                request.token
            )));
        };
        let pay_to = request.project.pay_to;

        // First matching log wins.
        let transfer = receipt
            .logs
            .iter()
            .filter(|log| log.address == token.address)
            .filter_map(decode_transfer)
            .find(|transfer| transfer.to == pay_to);

        let Some(transfer) = transfer else {
            return Ok(BlockchainVerification::failure(format!(
                "No {} transfer found to {:?}",
                token.symbol, pay_to
            )));
        };

        let required = parse_amount_to_wei(request.amount, token.decimals)?;
        let tolerance = tolerance_for_decimals(token.decimals);
        if !within_tolerance(transfer.value, required, tolerance) {
            return Ok(BlockchainVerification::failure(format!(
                "Amount mismatch: expected {} {}, got {} {}",
                request.amount,
                token.symbol,
                wei_to_token_units(transfer.value, token.decimals),
                token.symbol
            )));
        }

        Ok(BlockchainVerification::verified(
            format!("{:?}", receipt.transaction_hash),
            wei_to_token_units(transfer.value, token.decimals),
            token.symbol,
            receipt.block_number,
        ))
    }
}
