//! Data models mirroring the asset-booking service's serializers.
//!
//! - `Asset`, `AssetStatus`, `AssetFilter`: bookable inventory
//! - `Category`, `SubCategory`, `Location`: classification and placement
//! - `Booking`, `BookingStatus`, `NewBooking`: the booking lifecycle
//! - `User`: the owner of a booking

pub mod asset;
pub mod booking;
pub mod category;
pub mod location;
pub mod user;

pub use asset::{filter_assets, Asset, AssetFilter, AssetStatus};
pub use booking::{Booking, BookingStatus, NewBooking};
pub use category::{Category, SubCategory};
pub use location::Location;
pub use user::User;
