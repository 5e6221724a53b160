//! Wire types shared between the countryfx backend and its clients.

pub mod types;

pub use types::{
    CountryRecord, ErrorResponse, MessageResponse, RefreshResponse, SortOrder, StatusResponse,
};
