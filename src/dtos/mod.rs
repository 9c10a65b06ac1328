pub mod billing;
pub mod customer;
pub mod daily_entry;
pub mod dairy_info;
pub mod dashboard;
pub mod milk_rate;
pub mod period;
pub mod purchase;
pub mod report;
pub mod user;
