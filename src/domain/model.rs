use serde::{Deserialize, Serialize};

/// Column order of the identity CSV. Order matters: it is the on-disk schema.
pub const IDENTITY_COLUMNS: &[&str] = &["Name", "Query", "TransfermarktId"];

/// Column order of the transfer CSV.
pub const TRANSFER_COLUMNS: &[&str] = &[
    "Query",
    "Season_Name",
    "Date",
    "Old_Club",
    "New_Club",
    "Market_Value",
    "Transfer_Fee",
];

/// One player resolved (or not) by the site search. A miss keeps the name
/// with both lookup fields empty so it is not searched again next run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRecord {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Query")]
    pub query: Option<String>,
    #[serde(rename = "TransfermarktId")]
    pub transfermarkt_id: Option<u32>,
}

impl IdentityRecord {
    pub fn hit(name: String, query: String, transfermarkt_id: u32) -> Self {
        Self {
            name,
            query: Some(query),
            transfermarkt_id: Some(transfermarkt_id),
        }
    }

    pub fn miss(name: String) -> Self {
        Self {
            name,
            query: None,
            transfermarkt_id: None,
        }
    }

    /// A record is scrapeable only when the search resolved both fields.
    pub fn player_ref(&self) -> Option<PlayerRef> {
        match (&self.query, self.transfermarkt_id) {
            (Some(query), Some(id)) => Some(PlayerRef {
                query: query.clone(),
                transfermarkt_id: id,
            }),
            _ => None,
        }
    }
}

/// The unit of work for the transfer scrape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerRef {
    pub query: String,
    pub transfermarkt_id: u32,
}

/// One club transition scraped from a player's transfer-history grid.
/// Cells are cleaned display text, not parsed values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRow {
    #[serde(rename = "Query")]
    pub query: String,
    #[serde(rename = "Season_Name")]
    pub season_name: String,
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Old_Club")]
    pub old_club: String,
    #[serde(rename = "New_Club")]
    pub new_club: String,
    #[serde(rename = "Market_Value")]
    pub market_value: String,
    #[serde(rename = "Transfer_Fee")]
    pub transfer_fee: String,
}
