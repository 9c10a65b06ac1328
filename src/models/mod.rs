pub mod bill_payment;
pub mod customer;
pub mod daily_entry;
pub mod dairy_info;
pub mod milk_rate;
pub mod purchase;
pub mod statement;
pub mod user;
