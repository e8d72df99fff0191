pub mod claim_service;
pub mod item_service;
pub mod marketplace_service;
pub mod notifier;
