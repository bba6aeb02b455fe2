pub mod checkout;
pub mod root;
