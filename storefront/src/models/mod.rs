// storefront/src/models/mod.rs

//! Records persisted by the store and returned by the API.

pub mod address;
pub mod cart;
pub mod notification;
pub mod order;
pub mod otp;
pub mod payment_method;
pub mod product;
pub mod review;
pub mod tracking;
pub mod user;

pub use address::ShippingAddress;
pub use cart::{Cart, CartItem};
pub use notification::{Notification, NotificationKind};
pub use order::{Order, OrderItem, PaymentStatus};
pub use otp::OtpState;
pub use payment_method::PaymentMethod;
pub use product::{Collection, Product, VariantInventory};
pub use review::{Review, ReviewSummary};
pub use tracking::{OrderTracking, TrackingStatus};
pub use user::{Gender, User};
