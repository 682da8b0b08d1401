//! Transaction Drafter
//!
//! Builds unsigned transaction skeletons. Nothing here touches the network.

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolCall;
use web3_agent_types::TxDraft;

use crate::chain::abi::{IUniswapV2Router02, IERC20};
use crate::chain::{CallRequest, Network, TokenRef};

pub const SWAP_DEADLINE_SECS: i64 = 20 * 60;
pub const SLIPPAGE_BPS: u64 = 300;

/// `approve(spender, amount)` on the token contract.
pub fn approval(token: Address, spender: Address, amount: U256, description: String) -> TxDraft {
    TxDraft {
        to: Some(token),
        data: IERC20::approveCall { spender, amount }.abi_encode().into(),
        value: U256::ZERO,
        description,
    }
}

/// Native transfers carry the amount as value and empty data.
pub fn transfer(token: TokenRef, to: Address, amount: U256, description: String) -> TxDraft {
    match token {
        TokenRef::Native => TxDraft {
            to: Some(to),
            data: Bytes::new(),
            value: amount,
            description,
        },
        TokenRef::Erc20(contract) => TxDraft {
            to: Some(contract),
            data: IERC20::transferCall { to, amount }.abi_encode().into(),
            value: U256::ZERO,
            description,
        },
    }
}

/// Contract creation: no destination, payload is the init code.
pub fn deployment(bytecode: Bytes, description: String) -> TxDraft {
    TxDraft {
        to: None,
        data: bytecode,
        value: U256::ZERO,
        description,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SwapSpec<'a> {
    pub network: Network,
    pub token_in: TokenRef,
    pub path: &'a [Address],
    pub amount_in: U256,
    pub amount_out_min: U256,
    pub recipient: Address,
    pub deadline: U256,
}

/// Router call matching the pair's native-ness.
pub fn swap(spec: SwapSpec<'_>, description: String) -> TxDraft {
    let path = spec.path.to_vec();
    let is_native_out = spec
        .path
        .last()
        .is_some_and(|last| *last == spec.network.wrapped_native());

    let (data, value) = if spec.token_in.is_native() {
        let call = IUniswapV2Router02::swapExactETHForTokensCall {
            amountOutMin: spec.amount_out_min,
            path,
            to: spec.recipient,
            deadline: spec.deadline,
        };
        (call.abi_encode(), spec.amount_in)
    } else if is_native_out {
        let call = IUniswapV2Router02::swapExactTokensForETHCall {
            amountIn: spec.amount_in,
            amountOutMin: spec.amount_out_min,
            path,
            to: spec.recipient,
            deadline: spec.deadline,
        };
        (call.abi_encode(), U256::ZERO)
    } else {
        let call = IUniswapV2Router02::swapExactTokensForTokensCall {
            amountIn: spec.amount_in,
            amountOutMin: spec.amount_out_min,
            path,
            to: spec.recipient,
            deadline: spec.deadline,
        };
        (call.abi_encode(), U256::ZERO)
    };

    TxDraft {
        to: Some(spec.network.router()),
        data: data.into(),
        value,
        description,
    }
}

/// Quoted output less the slippage allowance.
pub fn min_out(quoted: U256, slippage_bps: u64) -> U256 {
    quoted * U256::from(10_000 - slippage_bps.min(10_000)) / U256::from(10_000u64)
}

pub fn deadline_from_now() -> U256 {
    let deadline = chrono::Utc::now().timestamp() + SWAP_DEADLINE_SECS;
    U256::from(deadline.max(0) as u64)
}

/// The draft as an `eth_estimateGas` call from `from`.
pub fn as_call(draft: &TxDraft, from: Option<Address>) -> CallRequest {
    CallRequest {
        from,
        to: draft.to,
        data: draft.data.clone(),
        value: draft.value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    const USER: Address = address!("1111111111111111111111111111111111111111");

    #[test]
    fn test_native_transfer_is_plain_value() {
        let draft = transfer(TokenRef::Native, USER, U256::from(7u64), "send".into());
        assert_eq!(draft.to, Some(USER));
        assert!(draft.data.is_empty());
        assert_eq!(draft.value, U256::from(7u64));
    }

    #[test]
    fn test_erc20_transfer_targets_contract() {
        let token = Network::BscTestnet.default_stable();
        let draft = transfer(TokenRef::Erc20(token), USER, U256::from(7u64), "send".into());
        assert_eq!(draft.to, Some(token));
        assert_eq!(draft.value, U256::ZERO);
        assert_eq!(&draft.data[..4], IERC20::transferCall::SELECTOR.as_slice());
        let decoded = IERC20::transferCall::abi_decode(&draft.data).unwrap();
        assert_eq!(decoded.to, USER);
        assert_eq!(decoded.amount, U256::from(7u64));
    }

    #[test]
    fn test_swap_from_native_carries_value() {
        let net = Network::BscTestnet;
        let path = [net.wrapped_native(), net.default_stable()];
        let amount = U256::from(500_000_000_000_000_000u64);
        let draft = swap(
            SwapSpec {
                network: net,
                token_in: TokenRef::Native,
                path: &path,
                amount_in: amount,
                amount_out_min: U256::from(1u64),
                recipient: USER,
                deadline: U256::from(1_700_000_000u64),
            },
            "swap".into(),
        );
        assert_eq!(draft.to, Some(net.router()));
        assert_eq!(draft.value, amount);
        assert_eq!(
            &draft.data[..4],
            IUniswapV2Router02::swapExactETHForTokensCall::SELECTOR.as_slice()
        );
    }

    #[test]
    fn test_swap_to_native_uses_tokens_for_eth() {
        let net = Network::BscTestnet;
        let path = [net.default_stable(), net.wrapped_native()];
        let draft = swap(
            SwapSpec {
                network: net,
                token_in: TokenRef::Erc20(net.default_stable()),
                path: &path,
                amount_in: U256::from(10u64),
                amount_out_min: U256::ZERO,
                recipient: USER,
                deadline: U256::from(1u64),
            },
            "swap".into(),
        );
        assert_eq!(draft.value, U256::ZERO);
        assert_eq!(
            &draft.data[..4],
            IUniswapV2Router02::swapExactTokensForETHCall::SELECTOR.as_slice()
        );
    }

    #[test]
    fn test_deployment_has_no_destination() {
        let draft = deployment(Bytes::from(vec![0x60, 0x80]), "Deploy".into());
        assert!(draft.is_contract_creation());
        assert_eq!(draft.value, U256::ZERO);
    }

    #[test]
    fn test_min_out_applies_slippage() {
        assert_eq!(min_out(U256::from(10_000u64), SLIPPAGE_BPS), U256::from(9_700u64));
        assert_eq!(min_out(U256::from(10_000u64), 20_000), U256::ZERO);
    }
}
