//! Claims Domain
//!
//! A claim is filed against a warranty and names the damaged warranty parts.
//! Claims carry two status axes, each derived from the claim's parts:
//!
//! ```text
//! Claim (C241201-PJ01-24112501-01) ──< ClaimWarrantyPart (-> WarrantyPart)
//!     approval = f(parts' approval)     tri-state or approved flag
//!     status   = f(parts' status)       Open / Closed
//! ```

pub mod axes;
pub mod claim;
pub mod error;
pub mod ports;
pub mod services;

pub use axes::{ClaimApprovalAxis, ClaimApprovalFlagAxis, ClaimComposite, ClaimLifecycleAxis};
pub use claim::{
    Claim, ClaimChange, ClaimPartChange, ClaimWarrantyPart, ClaimWithParts, NewClaim, NewClaimPart,
};
pub use error::ClaimError;
pub use ports::{ClaimsPort, ClaimsUnitOfWork};
pub use services::{ClaimApprovalMode, ClaimService};
