//! Warranty Domain
//!
//! Shops register warranties on film installed per car part. Each warranty
//! carries an approval status that mirrors its parts:
//!
//! ```text
//! Shop (JH01) ──< Warranty (JH01-24112501) ──< WarrantyPart (FWS, R1, ...)
//!                     approval = f(parts' approval)
//! ```
//!
//! Warranty parts draw their film from stock that head office allocates to
//! the shop; see [`product`].
//!
//! Warranty numbers and branch codes are generated per prefix inside the
//! creating unit of work; see [`numbering`].

pub mod account;
pub mod axes;
pub mod error;
pub mod numbering;
pub mod ports;
pub mod product;
pub mod services;
pub mod shop;
pub mod storage;
pub mod warranty;

pub use account::{hash_password, verify_password, NewAccount, NewUser, User, UserRole};
pub use axes::{WarrantyApprovalAxis, WarrantyComposite};
pub use error::WarrantyError;
pub use ports::{WarrantyPort, WarrantyUnitOfWork};
pub use product::{
    NewProduct, NewProductAllocation, Product, ProductAllocation, ProductChange, ShopProduct,
};
pub use services::{AccountService, ProductService, ShopService, WarrantyService};
pub use shop::{MalaysianState, NewShop, Shop, ShopChange};
pub use storage::{ObjectStorage, UploadFolder};
pub use warranty::{
    CarPart, NewWarranty, NewWarrantyPart, Warranty, WarrantyChange, WarrantyPart,
    WarrantyPartChange, WarrantyWithParts,
};
