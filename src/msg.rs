use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{Addr, Uint128};

#[cw_serde]
pub struct InstantiateMsg {
    pub denom: String,
}

#[cw_serde]
pub enum ExecuteMsg {
    /// List an NFT for sale. Re-listing a listed token overwrites the
    /// previous listing.
    ListItem {
        nft_contract: String,
        token_id: String,
        price: Uint128,
    },
    CancelListing {
        nft_contract: String,
        token_id: String,
    },
    UpdateListing {
        nft_contract: String,
        token_id: String,
        new_price: Uint128,
    },
    /// Buy a listed NFT. Payment is the single native coin attached to the
    /// call and must cover the listed price; any excess goes to the seller.
    BuyItem {
        nft_contract: String,
        token_id: String,
    },
    Withdraw { amount: Uint128 },
}

/// An unlisted token yields the empty response (zero price, no seller)
/// rather than an error.
#[cw_serde]
pub struct ListingResponse {
    pub price: Uint128,
    pub seller: Option<Addr>,
}

/// Listing plus its key, for the enumeration queries.
#[cw_serde]
pub struct ListingEntry {
    pub nft_contract: Addr,
    pub token_id: String,
    pub price: Uint128,
    pub seller: Addr,
}

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    #[returns(ListingResponse)]
    GetListing {
        nft_contract: String,
        token_id: String,
    },
    #[returns(Uint128)]
    GetProceeds { seller: String },
    #[returns(Vec<ListingEntry>)]
    GetListingsBySeller {
        seller: String,
        from_index: Option<u64>,
        limit: Option<u64>,
    },
    #[returns(Vec<ListingEntry>)]
    GetAllListings {
        from_index: Option<u64>,
        limit: Option<u64>,
    },
    #[returns(u64)]
    GetListingCount {},
}

#[cw_serde]
pub struct MigrateMsg {}
