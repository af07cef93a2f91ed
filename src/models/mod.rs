mod analytics;
mod batch;
mod claim;
mod product;
mod shop;
mod unit;
mod user;

pub use analytics::*;
pub use batch::*;
pub use claim::*;
pub use product::*;
pub use shop::*;
pub use unit::*;
pub use user::*;
