//! ERC20 call payload encoding.

use alloy::primitives::{Address, Bytes, U256};
use alloy::sol;
use alloy::sol_types::SolCall;

sol! {
    /// Standard ERC20 transfer.
    function transfer(address to, uint256 amount) external returns (bool);
}

/// Encode `transfer(address,uint256)` calldata.
pub fn encode_transfer(to: Address, amount: U256) -> Bytes {
    transferCall { to, amount }.abi_encode().into()
}
