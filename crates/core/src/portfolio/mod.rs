pub mod lots;
pub mod positions;
pub mod valuation;
