use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Uint128};
use cw_storage_plus::{Item, Map};

#[cw_serde]
pub struct Config {
    /// Native denomination all prices, payments and withdrawals use.
    pub denom: String,
}

#[cw_serde]
pub struct Listing {
    pub price: Uint128,
    pub seller: Addr,
}

pub const CONFIG: Item<Config> = Item::new("config");

/// Active listings, keyed by (NFT contract, token id). Presence in the map
/// is what "listed" means; entries are removed on cancel and on sale.
pub const LISTINGS: Map<(Addr, String), Listing> = Map::new("listings");

/// Withdrawable sale proceeds per seller. Entries stay at zero after a full
/// withdrawal instead of being removed.
pub const PROCEEDS: Map<Addr, Uint128> = Map::new("proceeds");

pub const LISTING_COUNTER: Item<u64> = Item::new("listing_counter");

/// Set while a sale's NFT transfer is in flight; every execute handler
/// rejects until the transfer reply clears it.
pub const PENDING_TRANSFER: Item<bool> = Item::new("pending_transfer");
