#[cfg(not(feature = "library"))]
use cosmwasm_std::entry_point;
use cosmwasm_std::{
    coins, to_json_binary, Addr, BankMsg, Binary, Deps, DepsMut, Env, MessageInfo, Order, Reply,
    Response, StdResult, SubMsg, Uint128, WasmMsg,
};
use cw2::set_contract_version;
use cw721::{Cw721ExecuteMsg, Cw721QueryMsg, OperatorResponse, OwnerOfResponse};
use cw_utils::must_pay;

use crate::error::ContractError;
use crate::msg::{ExecuteMsg, InstantiateMsg, ListingEntry, ListingResponse, MigrateMsg, QueryMsg};
use crate::state::{
    Config, Listing, CONFIG, LISTINGS, LISTING_COUNTER, PENDING_TRANSFER, PROCEEDS,
};

pub const CONTRACT_NAME: &str = "nft-marketplace";
pub const CONTRACT_VERSION: &str = "0.1.0";

pub const TRANSFER_REPLY: u64 = 1;

const DEFAULT_LIMIT: u64 = 10;

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn instantiate(
    deps: DepsMut,
    _env: Env,
    _info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response, ContractError> {
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    CONFIG.save(
        deps.storage,
        &Config {
            denom: msg.denom.clone(),
        },
    )?;
    LISTING_COUNTER.save(deps.storage, &0u64)?;
    PENDING_TRANSFER.save(deps.storage, &false)?;

    Ok(Response::new()
        .add_attribute("action", "instantiate")
        .add_attribute("denom", msg.denom))
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn execute(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    msg: ExecuteMsg,
) -> Result<Response, ContractError> {
    // No state change may interleave with a sale whose NFT transfer has not
    // settled yet.
    if PENDING_TRANSFER.may_load(deps.storage)?.unwrap_or(false) {
        return Err(ContractError::TransferInProgress {});
    }

    match msg {
        ExecuteMsg::ListItem {
            nft_contract,
            token_id,
            price,
        } => execute_list_item(deps, env, info, nft_contract, token_id, price),
        ExecuteMsg::CancelListing {
            nft_contract,
            token_id,
        } => execute_cancel_listing(deps, info, nft_contract, token_id),
        ExecuteMsg::UpdateListing {
            nft_contract,
            token_id,
            new_price,
        } => execute_update_listing(deps, info, nft_contract, token_id, new_price),
        ExecuteMsg::BuyItem {
            nft_contract,
            token_id,
        } => execute_buy_item(deps, info, nft_contract, token_id),
        ExecuteMsg::Withdraw { amount } => execute_withdraw(deps, info, amount),
    }
}

/// Current owner of the token per the NFT contract, along with the token's
/// unexpired direct approvals.
fn token_owner(
    deps: Deps,
    nft_contract: &Addr,
    token_id: &str,
) -> Result<OwnerOfResponse, ContractError> {
    let owner: OwnerOfResponse = deps.querier.query_wasm_smart(
        nft_contract,
        &Cw721QueryMsg::OwnerOf {
            token_id: token_id.to_string(),
            include_expired: None,
        },
    )?;

    Ok(owner)
}

/// Whether this contract may move the token: either a direct approval on the
/// token or an operator grant for its owner.
fn marketplace_is_approved(
    deps: Deps,
    env: &Env,
    nft_contract: &Addr,
    owner: &OwnerOfResponse,
) -> bool {
    let marketplace = env.contract.address.as_str();
    if owner.approvals.iter().any(|a| a.spender == marketplace) {
        return true;
    }

    // cw721 rejects the Operator query when no grant exists.
    deps.querier
        .query_wasm_smart::<OperatorResponse>(
            nft_contract,
            &Cw721QueryMsg::Operator {
                owner: owner.owner.clone(),
                operator: marketplace.to_string(),
                include_expired: None,
            },
        )
        .is_ok()
}

pub fn execute_list_item(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    nft_contract: String,
    token_id: String,
    price: Uint128,
) -> Result<Response, ContractError> {
    if price.is_zero() {
        return Err(ContractError::PriceInvalid {});
    }

    let nft_contract = deps.api.addr_validate(&nft_contract)?;
    let owner = token_owner(deps.as_ref(), &nft_contract, &token_id)?;
    if owner.owner != info.sender {
        return Err(ContractError::IsNotOwner {});
    }
    if !marketplace_is_approved(deps.as_ref(), &env, &nft_contract, &owner) {
        return Err(ContractError::NotApproved {});
    }

    let key = (nft_contract.clone(), token_id.clone());
    // Re-listing overwrites; only a fresh insert bumps the counter.
    if LISTINGS.may_load(deps.storage, key.clone())?.is_none() {
        LISTING_COUNTER.update(deps.storage, |counter| -> StdResult<u64> { Ok(counter + 1) })?;
    }
    LISTINGS.save(
        deps.storage,
        key,
        &Listing {
            price,
            seller: info.sender.clone(),
        },
    )?;

    Ok(Response::new()
        .add_attribute("action", "item_listed")
        .add_attribute("nft_contract", nft_contract)
        .add_attribute("token_id", token_id)
        .add_attribute("price", price)
        .add_attribute("seller", info.sender))
}

pub fn execute_cancel_listing(
    deps: DepsMut,
    info: MessageInfo,
    nft_contract: String,
    token_id: String,
) -> Result<Response, ContractError> {
    let nft_contract = deps.api.addr_validate(&nft_contract)?;
    let key = (nft_contract.clone(), token_id.clone());
    if LISTINGS.may_load(deps.storage, key.clone())?.is_none() {
        return Err(ContractError::IsNotListed {
            nft_contract,
            token_id,
        });
    }

    // Ownership may have moved since listing; the current owner, not the
    // stored seller, is who may cancel.
    let owner = token_owner(deps.as_ref(), &nft_contract, &token_id)?;
    if owner.owner != info.sender {
        return Err(ContractError::IsNotOwner {});
    }

    LISTINGS.remove(deps.storage, key);
    LISTING_COUNTER.update(deps.storage, |counter| -> StdResult<u64> {
        Ok(counter.saturating_sub(1))
    })?;

    Ok(Response::new()
        .add_attribute("action", "item_canceled")
        .add_attribute("nft_contract", nft_contract)
        .add_attribute("token_id", token_id)
        .add_attribute("seller", info.sender))
}

pub fn execute_update_listing(
    deps: DepsMut,
    info: MessageInfo,
    nft_contract: String,
    token_id: String,
    new_price: Uint128,
) -> Result<Response, ContractError> {
    let nft_contract = deps.api.addr_validate(&nft_contract)?;
    let key = (nft_contract.clone(), token_id.clone());
    let mut listing =
        LISTINGS
            .may_load(deps.storage, key.clone())?
            .ok_or(ContractError::IsNotListed {
                nft_contract: nft_contract.clone(),
                token_id: token_id.clone(),
            })?;

    let owner = token_owner(deps.as_ref(), &nft_contract, &token_id)?;
    if owner.owner != info.sender {
        return Err(ContractError::IsNotOwner {});
    }
    if new_price.is_zero() {
        return Err(ContractError::PriceInvalid {});
    }

    listing.price = new_price;
    LISTINGS.save(deps.storage, key, &listing)?;

    // An update republishes the listing rather than emitting its own event.
    Ok(Response::new()
        .add_attribute("action", "item_listed")
        .add_attribute("nft_contract", nft_contract)
        .add_attribute("token_id", token_id)
        .add_attribute("price", new_price)
        .add_attribute("seller", listing.seller))
}

pub fn execute_buy_item(
    deps: DepsMut,
    info: MessageInfo,
    nft_contract: String,
    token_id: String,
) -> Result<Response, ContractError> {
    let nft_contract = deps.api.addr_validate(&nft_contract)?;
    let key = (nft_contract.clone(), token_id.clone());
    let listing =
        LISTINGS
            .may_load(deps.storage, key.clone())?
            .ok_or(ContractError::IsNotListed {
                nft_contract: nft_contract.clone(),
                token_id: token_id.clone(),
            })?;

    let config = CONFIG.load(deps.storage)?;
    let payment = must_pay(&info, &config.denom)?;
    if payment < listing.price {
        return Err(ContractError::PaymentIsNotEnough {
            price: listing.price,
        });
    }

    // Credit the seller and drop the listing before the NFT contract runs:
    // a reentrant call during the transfer must already see the sale done.
    // The full payment is credited; overpayment is not refunded.
    PROCEEDS.update(
        deps.storage,
        listing.seller.clone(),
        |proceeds| -> StdResult<Uint128> { Ok(proceeds.unwrap_or_default().checked_add(payment)?) },
    )?;
    LISTINGS.remove(deps.storage, key);
    LISTING_COUNTER.update(deps.storage, |counter| -> StdResult<u64> {
        Ok(counter.saturating_sub(1))
    })?;

    PENDING_TRANSFER.save(deps.storage, &true)?;
    let transfer = SubMsg::reply_on_success(
        WasmMsg::Execute {
            contract_addr: nft_contract.to_string(),
            msg: to_json_binary(&Cw721ExecuteMsg::TransferNft {
                recipient: info.sender.to_string(),
                token_id: token_id.clone(),
            })?,
            funds: vec![],
        },
        TRANSFER_REPLY,
    );

    Ok(Response::new()
        .add_attribute("action", "item_bought")
        .add_attribute("nft_contract", nft_contract)
        .add_attribute("token_id", token_id)
        .add_attribute("buyer", info.sender)
        .add_attribute("price", payment)
        .add_submessage(transfer))
}

pub fn execute_withdraw(
    deps: DepsMut,
    info: MessageInfo,
    amount: Uint128,
) -> Result<Response, ContractError> {
    if amount.is_zero() {
        return Err(ContractError::ZeroWithdrawAmount {});
    }
    let balance = PROCEEDS
        .may_load(deps.storage, info.sender.clone())?
        .unwrap_or_default();
    if balance.is_zero() {
        return Err(ContractError::NoProceeds {});
    }
    if amount > balance {
        return Err(ContractError::WithdrawExcess { balance });
    }

    // Debit before the bank send; the account keeps a zero entry after a
    // full withdrawal.
    PROCEEDS.save(deps.storage, info.sender.clone(), &(balance - amount))?;

    let config = CONFIG.load(deps.storage)?;
    let payout = BankMsg::Send {
        to_address: info.sender.to_string(),
        amount: coins(amount.u128(), config.denom),
    };

    Ok(Response::new()
        .add_attribute("action", "withdraw_proceeds")
        .add_attribute("seller", info.sender)
        .add_attribute("amount", amount)
        .add_message(payout))
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn reply(deps: DepsMut, _env: Env, reply: Reply) -> Result<Response, ContractError> {
    match reply.id {
        TRANSFER_REPLY => {
            PENDING_TRANSFER.save(deps.storage, &false)?;
            Ok(Response::new().add_attribute("action", "transfer_settled"))
        }
        _ => Err(ContractError::UnrecognizedReply {}),
    }
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn migrate(_deps: DepsMut, _env: Env, _msg: MigrateMsg) -> Result<Response, ContractError> {
    Ok(Response::default())
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn query(deps: Deps, _env: Env, msg: QueryMsg) -> StdResult<Binary> {
    match msg {
        QueryMsg::GetListing {
            nft_contract,
            token_id,
        } => to_json_binary(&get_listing(deps, nft_contract, token_id)?),
        QueryMsg::GetProceeds { seller } => to_json_binary(&get_proceeds(deps, seller)?),
        QueryMsg::GetListingsBySeller {
            seller,
            from_index,
            limit,
        } => to_json_binary(&get_listings_by_seller(deps, seller, from_index, limit)?),
        QueryMsg::GetAllListings { from_index, limit } => {
            to_json_binary(&get_all_listings(deps, from_index, limit)?)
        }
        QueryMsg::GetListingCount {} => to_json_binary(&get_listing_count(deps)?),
    }
}

pub fn get_listing(
    deps: Deps,
    nft_contract: String,
    token_id: String,
) -> StdResult<ListingResponse> {
    let nft_contract = deps.api.addr_validate(&nft_contract)?;

    Ok(
        match LISTINGS.may_load(deps.storage, (nft_contract, token_id))? {
            Some(listing) => ListingResponse {
                price: listing.price,
                seller: Some(listing.seller),
            },
            None => ListingResponse {
                price: Uint128::zero(),
                seller: None,
            },
        },
    )
}

pub fn get_proceeds(deps: Deps, seller: String) -> StdResult<Uint128> {
    let seller = deps.api.addr_validate(&seller)?;

    Ok(PROCEEDS.may_load(deps.storage, seller)?.unwrap_or_default())
}

pub fn get_listing_count(deps: Deps) -> StdResult<u64> {
    LISTING_COUNTER.load(deps.storage)
}

pub fn get_all_listings(
    deps: Deps,
    from_index: Option<u64>,
    limit: Option<u64>,
) -> StdResult<Vec<ListingEntry>> {
    let from_index = from_index.unwrap_or(0);
    let limit = limit.unwrap_or(DEFAULT_LIMIT);

    LISTINGS
        .range(deps.storage, None, None, Order::Ascending)
        .skip(from_index as usize)
        .take(limit as usize)
        .map(entry_from_item)
        .collect()
}

pub fn get_listings_by_seller(
    deps: Deps,
    seller: String,
    from_index: Option<u64>,
    limit: Option<u64>,
) -> StdResult<Vec<ListingEntry>> {
    let seller = deps.api.addr_validate(&seller)?;
    let from_index = from_index.unwrap_or(0);
    let limit = limit.unwrap_or(DEFAULT_LIMIT);

    LISTINGS
        .range(deps.storage, None, None, Order::Ascending)
        .filter(|item| match item {
            Ok((_, listing)) => listing.seller == seller,
            Err(_) => true,
        })
        .skip(from_index as usize)
        .take(limit as usize)
        .map(entry_from_item)
        .collect()
}

fn entry_from_item(item: StdResult<((Addr, String), Listing)>) -> StdResult<ListingEntry> {
    let ((nft_contract, token_id), listing) = item?;

    Ok(ListingEntry {
        nft_contract,
        token_id,
        price: listing.price,
        seller: listing.seller,
    })
}
