//! Entity module - SeaORM entity definitions for the four settlement collections.
//! Every table is keyed by a composite string identifier built in [`crate::core::keys`].

pub mod daily_record;
pub mod final_payout;
pub mod route;
pub mod user;

pub use daily_record::{
    Column as DailyRecordColumn, Entity as DailyRecord, Model as DailyRecordModel,
};
pub use final_payout::{
    Column as FinalPayoutColumn, Entity as FinalPayout, Model as FinalPayoutModel,
};
pub use route::{Column as RouteColumn, Entity as Route, Model as RouteModel, RouteType, Shift};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel, Role};
