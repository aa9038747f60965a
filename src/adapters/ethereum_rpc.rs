use alloy::{
    primitives::{
        Address,
        Bytes,
        B256,
    },
    providers::{
        DynProvider,
        Provider,
        ProviderBuilder,
    },
    rpc::types::Filter,
    sol,
    sol_types::{
        SolCall,
        SolEvent,
    },
};

use crate::domain::proof::WithdrawalProof;
use crate::ports::ledger::{
    DepositEvent,
    LedgerError,
    LedgerPort,
};

// Mixer contract bindings. The contract holds a fixed denomination per
// deposit and a bounded history of recent roots.
sol! {
    #[sol(rpc)]
    interface IMixer {
        function denomination() external view returns (uint256);
        function getLastRoot() external view returns (bytes32);
        function isKnownRoot(bytes32 root) external view returns (bool);
        function nullifierHashes(bytes32 nullifierHash) external view returns (bool);
        function nextIndex() external view returns (uint32);

        function deposit(bytes32 commitment) external payable;

        function withdraw(
            bytes calldata proof,
            bytes32 root,
            bytes32 nullifierHash,
            address payable recipient,
            address payable relayer,
            uint256 fee
        ) external;

        event Deposit(bytes32 indexed commitment, uint32 leafIndex, uint256 timestamp);
    }
}

/// Read-only Ethereum adapter for the mixer ledger.
///
/// Holds no signer: this core constructs call payloads (see
/// [`deposit_calldata`] / [`withdraw_calldata`]) but signing and
/// broadcasting belong to the wallet layer.
pub struct EthereumLedger {
    provider: DynProvider,
    mixer: Address,
}

impl EthereumLedger {
    pub fn new(rpc_url: &str, mixer: Address) -> Result<Self, LedgerError> {
        let provider = DynProvider::new(ProviderBuilder::new().connect_http(
            rpc_url
                .parse()
                .map_err(|e| LedgerError::RpcError(format!("invalid RPC URL: {e}")))?,
        ));
        Ok(Self { provider, mixer })
    }

    pub fn mixer_address(&self) -> Address {
        self.mixer
    }

    /// The fixed deposit denomination, in wei.
    pub async fn denomination(&self) -> Result<alloy::primitives::U256, LedgerError> {
        let mixer = IMixer::new(self.mixer, &self.provider);
        mixer
            .denomination()
            .call()
            .await
            .map_err(|e| LedgerError::ContractError(e.to_string()))
    }
}

impl LedgerPort for EthereumLedger {
    async fn get_deposit_count(&self) -> Result<u64, LedgerError> {
        let mixer = IMixer::new(self.mixer, &self.provider);
        let next = mixer
            .nextIndex()
            .call()
            .await
            .map_err(|e| LedgerError::ContractError(e.to_string()))?;
        Ok(next as u64)
    }

    async fn get_last_root(&self) -> Result<B256, LedgerError> {
        let mixer = IMixer::new(self.mixer, &self.provider);
        let root = mixer
            .getLastRoot()
            .call()
            .await
            .map_err(|e| LedgerError::ContractError(e.to_string()))?;
        Ok(root)
    }

    async fn is_known_root(&self, root: B256) -> Result<bool, LedgerError> {
        let mixer = IMixer::new(self.mixer, &self.provider);
        mixer
            .isKnownRoot(root)
            .call()
            .await
            .map_err(|e| LedgerError::ContractError(e.to_string()))
    }

    async fn is_nullifier_spent(&self, nullifier_hash: B256) -> Result<bool, LedgerError> {
        let mixer = IMixer::new(self.mixer, &self.provider);
        mixer
            .nullifierHashes(nullifier_hash)
            .call()
            .await
            .map_err(|e| LedgerError::ContractError(e.to_string()))
    }

    async fn current_block(&self) -> Result<u64, LedgerError> {
        self.provider
            .get_block_number()
            .await
            .map_err(|e| LedgerError::RpcError(e.to_string()))
    }

    async fn get_deposit_events(
        &self,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<DepositEvent>, LedgerError> {
        let filter = Filter::new()
            .address(self.mixer)
            .event_signature(IMixer::Deposit::SIGNATURE_HASH)
            .from_block(from_block)
            .to_block(to_block);

        let mut logs = self
            .provider
            .get_logs(&filter)
            .await
            .map_err(|e| LedgerError::RpcError(format!("Deposit query: {e}")))?;

        // Deterministic ordering within the batch.
        logs.sort_by_key(|l| (l.block_number, l.log_index));

        let mut events = Vec::with_capacity(logs.len());
        for log in &logs {
            let decoded = log
                .log_decode::<IMixer::Deposit>()
                .map_err(|e| LedgerError::InvalidResponse(format!("Deposit decode: {e}")))?;
            let inner = decoded.inner;
            events.push(DepositEvent {
                commitment: inner.commitment,
                leaf_index: inner.leafIndex as u64,
                timestamp: inner.timestamp.try_into().unwrap_or(u64::MAX),
                block_number: log.block_number.unwrap_or_default(),
                tx_hash: log.transaction_hash.unwrap_or_default(),
            });
        }
        Ok(events)
    }
}

/// Calldata for `deposit(commitment)`. The caller attaches the denomination
/// as transaction value, signs, and broadcasts.
pub fn deposit_calldata(commitment: B256) -> Bytes {
    IMixer::depositCall { commitment }.abi_encode().into()
}

/// Calldata for `withdraw(proof, root, nullifierHash, recipient, relayer, fee)`.
pub fn withdraw_calldata(proof: &WithdrawalProof) -> Bytes {
    IMixer::withdrawCall {
        proof: proof.proof.clone(),
        root: proof.public_inputs.root,
        nullifierHash: proof.public_inputs.nullifier_hash,
        recipient: proof.public_inputs.recipient,
        relayer: proof.public_inputs.relayer,
        fee: proof.public_inputs.fee,
    }
    .abi_encode()
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::U256;

    use crate::domain::proof::WithdrawalPublicInputs;

    #[test]
    fn test_deposit_calldata_selector() {
        let calldata = deposit_calldata(B256::repeat_byte(0x01));
        assert_eq!(&calldata[..4], IMixer::depositCall::SELECTOR);
        assert_eq!(calldata.len(), 4 + 32);
    }

    #[test]
    fn test_withdraw_calldata_roundtrip() {
        let proof = WithdrawalProof {
            proof: Bytes::from(vec![0xaa; 16]),
            public_inputs: WithdrawalPublicInputs {
                root: B256::repeat_byte(0x01),
                nullifier_hash: B256::repeat_byte(0x02),
                recipient: Address::repeat_byte(0x03),
                relayer: Address::ZERO,
                fee: U256::from(7u64),
            },
        };

        let calldata = withdraw_calldata(&proof);
        assert_eq!(&calldata[..4], IMixer::withdrawCall::SELECTOR);

        let decoded = IMixer::withdrawCall::abi_decode(&calldata).unwrap();
        assert_eq!(decoded.root, proof.public_inputs.root);
        assert_eq!(decoded.nullifierHash, proof.public_inputs.nullifier_hash);
        assert_eq!(decoded.recipient, proof.public_inputs.recipient);
        assert_eq!(decoded.fee, proof.public_inputs.fee);
        assert_eq!(decoded.proof, proof.proof);
    }
}
