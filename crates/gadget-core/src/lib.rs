//! # gadget-core: Pure Domain Logic for Gadget Prima POS
//!
//! Everything the POS front end decides without touching the network or
//! disk: the data model, money, validation, role-gated navigation, the cart,
//! and report aggregation.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Gadget Prima POS Architecture                      │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    apps/terminal (bootstrap)                    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    gadget-client (I/O)                          │   │
//! │  │   session • gateway • normalize • aggregate • mutations • app  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ gadget-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │ navigation│  │   cart    │  │  reports  │  │   │
//! │  │   │  Product  │  │   MENU    │  │   Cart    │  │ Dashboard │  │   │
//! │  │   │  Snapshot │  │ Navigator │  │ checkout  │  │  Period   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • NO CLOCK • PURE FUNCTIONS              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Identity, Product, Transaction, Snapshot, ...)
//! - [`money`] - Integer money in whole rupiah
//! - [`error`] - Domain error types
//! - [`validation`] - Form rules for the CRUD dialogs
//! - [`navigation`] - Static menu table, role filter, auth/section state machine
//! - [`cart`] - Cashier cart and checkout
//! - [`reports`] - Dashboard and period report aggregation
//!
//! ## Example Usage
//!
//! ```rust
//! use gadget_core::navigation::{visible_sections_for, Section};
//!
//! let sections = visible_sections_for("Cashier");
//! assert_eq!(sections, vec![Section::Dashboard, Section::Transactions]);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod money;
pub mod navigation;
pub mod reports;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartItem, CartTotals};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use navigation::{AuthState, LoginAttempt, MenuItem, Navigator, Section, MENU};
pub use reports::{DashboardSummary, PeriodReport, ProductFilter};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line.
///
/// ## Business Reason
/// Catches typos at the till (1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;
