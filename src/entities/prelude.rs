pub use super::claims::Entity as Claims;
pub use super::items::Entity as Items;
pub use super::marketplace_items::Entity as MarketplaceItems;
pub use super::users::Entity as Users;
