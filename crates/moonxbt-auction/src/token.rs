use alloy::primitives::{Address, TxHash, U256};
use alloy::providers::Provider;

use crate::contracts::IERC20;
use crate::error::AuctionError;

/// ERC20 access for the bid token.
pub struct TokenClient<P> {
    token: IERC20::IERC20Instance<P>,
}

impl<P: Provider> TokenClient<P> {
    pub fn new(address: Address, provider: P) -> Self {
        Self {
            token: IERC20::new(address, provider),
        }
    }

    pub async fn allowance(&self, owner: Address, spender: Address) -> Result<U256, AuctionError> {
        Ok(self.token.allowance(owner, spender).call().await?)
    }

    pub async fn balance_of(&self, account: Address) -> Result<U256, AuctionError> {
        Ok(self.token.balanceOf(account).call().await?)
    }

    /// Approve `spender` for `amount` unless the current allowance already covers
    /// it. Returns the approval transaction when one was sent.
    pub async fn ensure_allowance(
        &self,
        owner: Address,
        spender: Address,
        amount: U256,
    ) -> Result<Option<TxHash>, AuctionError> {
        let current = self.allowance(owner, spender).await?;
        if current >= amount {
            tracing::debug!(%owner, %spender, %current, "Allowance already sufficient");
            return Ok(None);
        }

        let pending = self
            .token
            .approve(spender, amount)
            .from(owner)
            .send()
            .await?;
        let tx_hash = *pending.tx_hash();
        tracing::info!(%tx_hash, %spender, %amount, "Approval sent");

        let receipt = pending.get_receipt().await?;
        if !receipt.status() {
            return Err(AuctionError::Reverted(tx_hash));
        }
        Ok(Some(tx_hash))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;
    use alloy::providers::ProviderBuilder;
    use alloy::sol_types::SolValue;

    const TOKEN: Address = address!("0x4444444444444444444444444444444444444444");
    const OWNER: Address = address!("0x5555555555555555555555555555555555555555");
    const SPENDER: Address = address!("0x6666666666666666666666666666666666666666");

    #[tokio::test]
    async fn sufficient_allowance_sends_nothing() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                serde_json::json!({
                    "jsonrpc": "2.0",
                    "id": 1,
                    "result": alloy::hex::encode_prefixed(U256::from(1000u64).abi_encode())
                })
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;

        let provider = ProviderBuilder::new().connect_http(server.url().parse().unwrap());
        let client = TokenClient::new(TOKEN, provider);

        let sent = client
            .ensure_allowance(OWNER, SPENDER, U256::from(500u64))
            .await
            .unwrap();
        assert_eq!(sent, None);
        mock.assert_async().await;
    }
}
