mod business;
mod coupon;
mod prize;
mod stamp;

pub use business::{Business, NewBusiness, UpdateBusiness};
pub use coupon::{Coupon, NewCoupon};
pub use prize::{NewPrize, Prize, UpdatePrize};
pub use stamp::{NewStamp, Stamp};
