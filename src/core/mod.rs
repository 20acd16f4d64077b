pub mod account;
pub mod batch;
pub mod claim;
pub mod currency;
pub mod period;
pub mod record;
