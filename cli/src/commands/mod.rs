pub mod fetch;
pub mod transfer;
