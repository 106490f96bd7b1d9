use cosmwasm_std::{Addr, StdError, Uint128};
use cw_utils::PaymentError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("{0}")]
    Payment(#[from] PaymentError),

    #[error("Price must be above zero")]
    PriceInvalid {},

    #[error("Marketplace is not approved to transfer the token")]
    NotApproved {},

    #[error("Token {token_id} of {nft_contract} is not listed")]
    IsNotListed { nft_contract: Addr, token_id: String },

    #[error("Caller is not the token owner")]
    IsNotOwner {},

    #[error("Payment is below the listed price {price}")]
    PaymentIsNotEnough { price: Uint128 },

    #[error("Withdrawal exceeds the available proceeds {balance}")]
    WithdrawExcess { balance: Uint128 },

    // Withdraw guard clauses.
    #[error("amount must be above zero")]
    ZeroWithdrawAmount {},

    #[error("no proceeds to withdraw")]
    NoProceeds {},

    #[error("A sale transfer is still settling")]
    TransferInProgress {},

    #[error("The reply ID is unrecognized")]
    UnrecognizedReply {},
}
