//! # Domain Types
//!
//! Core domain types used throughout the Gadget Prima POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Identity     │   │    Product      │   │  Transaction    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id, email      │   │  id, sku        │   │  id, date       │       │
//! │  │  role           │   │  price, stock   │   │  items[]        │       │
//! │  │  token          │   │  purchasePrice  │   │  total          │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Role        │   │ PaymentMethod   │   │    Expense      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  Admin          │   │  Cash           │   │  date, amount   │       │
//! │  │  Cashier        │   │  Card           │   │  category       │       │
//! │  │  Warehouse      │   │  EWallet        │   └─────────────────┘       │
//! │  │  Owner          │   └─────────────────┘                             │
//! │  └─────────────────┘                                                    │
//! │                                                                         │
//! │  Snapshot = (products, transactions, expenses, users, categories,      │
//! │              brands) as held by the aggregate data context             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identifiers
//! The backend hands out numeric ids; older exports used strings. Every id is
//! kept as a `String` so both shapes survive normalization unchanged.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;

// =============================================================================
// Role
// =============================================================================

/// The role attached to an identity.
///
/// Upstream data is inconsistent about casing ("Admin", "ADMIN", " cashier "),
/// so parsing is case-insensitive and trims whitespace. Serialization always
/// writes the lowercase form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    Admin,
    Cashier,
    Warehouse,
    Owner,
}

impl Role {
    /// Every role, in declaration order.
    pub const ALL: [Role; 4] = [Role::Admin, Role::Cashier, Role::Warehouse, Role::Owner];

    /// Parses a role, returning `None` for anything outside the known set.
    pub fn parse_lenient(raw: &str) -> Option<Role> {
        raw.parse().ok()
    }

    /// Lowercase wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Cashier => "cashier",
            Role::Warehouse => "warehouse",
            Role::Owner => "owner",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "cashier" => Ok(Role::Cashier),
            "warehouse" => Ok(Role::Warehouse),
            "owner" => Ok(Role::Owner),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Identity
// =============================================================================

/// The authenticated user and the bearer token issued for them.
///
/// ## Persistence
/// The token and the profile are persisted under two separate keys. The
/// profile JSON never carries the token (`skip_serializing`), and a restored
/// identity gets its token from the token key.
///
/// The role is kept as the raw upstream string; [`Identity::role`] interprets
/// it. An identity with an unrecognised role is still a valid session, it just
/// sees no gated sections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Identity {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    #[serde(default, skip_serializing)]
    #[ts(skip)]
    pub token: String,
}

impl Identity {
    /// Interprets the stored role string.
    pub fn role(&self) -> Option<Role> {
        Role::parse_lenient(&self.role)
    }

    /// Builds an identity from a user record and the token issued with it.
    pub fn from_user(user: User, token: impl Into<String>) -> Self {
        Identity {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            token: token.into(),
        }
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product in the catalog.
///
/// ## Invariants
/// - `price`, `purchase_price` and `stock` are non-negative
/// - `sku` is unique within the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Product {
    pub id: String,
    pub name: String,
    /// Stock Keeping Unit - business identifier.
    pub sku: String,
    pub category: String,
    pub brand: String,
    /// Selling price.
    pub price: Money,
    /// Buying price, used for cost of goods in reports. 0 when unknown.
    pub purchase_price: Money,
    pub stock: i64,
    /// Threshold at or below which the product shows as low stock.
    pub min_stock: i64,
    pub description: String,
    pub image: Option<String>,
}

impl Product {
    /// True when stock has dropped to the reorder threshold.
    pub fn is_low_stock(&self) -> bool {
        self.stock <= self.min_stock
    }

    /// True when `quantity` units can be taken from stock.
    pub fn can_sell(&self, quantity: i64) -> bool {
        quantity > 0 && self.stock >= quantity
    }

    /// Price minus purchase price, per unit.
    pub fn unit_margin(&self) -> Money {
        self.price - self.purchase_price
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum PaymentMethod {
    #[serde(rename = "cash")]
    Cash,
    #[serde(rename = "card")]
    Card,
    #[serde(rename = "e-wallet")]
    EWallet,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 3] =
        [PaymentMethod::Cash, PaymentMethod::Card, PaymentMethod::EWallet];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::EWallet => "e-wallet",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cash" | "tunai" => Ok(PaymentMethod::Cash),
            "card" | "debit" | "credit" => Ok(PaymentMethod::Card),
            "e-wallet" | "ewallet" | "e_wallet" => Ok(PaymentMethod::EWallet),
            other => Err(format!("unknown payment method '{}'", other)),
        }
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// A line in a transaction.
///
/// Uses the snapshot pattern: name and price are frozen at the time of sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TransactionItem {
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub price: Money,
    /// `quantity * price`.
    pub subtotal: Money,
}

impl TransactionItem {
    /// Builds a line with the subtotal computed from quantity and price.
    pub fn new(
        product_id: impl Into<String>,
        product_name: impl Into<String>,
        quantity: i64,
        price: Money,
    ) -> Self {
        TransactionItem {
            product_id: product_id.into(),
            product_name: product_name.into(),
            quantity,
            price,
            subtotal: price.multiply_quantity(quantity),
        }
    }
}

/// A completed sale. Append-only: once created it is never edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Transaction {
    pub id: String,
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    pub items: Vec<TransactionItem>,
    pub total: Money,
    pub cashier_id: String,
    pub cashier_name: String,
    pub payment_method: PaymentMethod,
}

impl Transaction {
    /// Sum of the line subtotals.
    pub fn computed_total(&self) -> Money {
        self.items.iter().map(|i| i.subtotal).sum()
    }

    /// Checks that `total` equals the sum of line subtotals.
    pub fn verify_total(&self) -> CoreResult<()> {
        let expected = self.computed_total();
        if expected != self.total {
            return Err(CoreError::TotalMismatch {
                total: self.total.amount(),
                expected: expected.amount(),
            });
        }
        Ok(())
    }

    /// Sum of the line subtotals, or `None` if it doesn't fit in an i64.
    pub fn checked_total(&self) -> Option<Money> {
        Money::checked_sum(self.items.iter().map(|i| i.subtotal))
    }

    /// Total units sold across all lines.
    pub fn item_count(&self) -> i64 {
        self.items
            .iter()
            .fold(0i64, |acc, i| acc.saturating_add(i.quantity))
    }
}

/// A transaction as submitted by checkout, before the backend assigns an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NewTransaction {
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    pub items: Vec<TransactionItem>,
    pub total: Money,
    pub cashier_id: String,
    pub cashier_name: String,
    pub payment_method: PaymentMethod,
}

// =============================================================================
// Expense
// =============================================================================

/// An operating expense. Independent of transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Expense {
    pub id: String,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub description: String,
    pub amount: Money,
    pub category: String,
}

// =============================================================================
// Users, Categories, Brands
// =============================================================================

/// A staff account, as listed on the settings screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Category {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Brand {
    pub id: String,
    pub name: String,
}

// =============================================================================
// Snapshot
// =============================================================================

/// Every backend-owned collection, as one consistent value.
///
/// An empty collection means "not loaded yet" or "that fetch failed"; both
/// are valid states. `cycle` identifies the load cycle that produced the
/// snapshot (0 for the initial empty one).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub products: Vec<Product>,
    pub transactions: Vec<Transaction>,
    pub expenses: Vec<Expense>,
    pub users: Vec<User>,
    pub categories: Vec<Category>,
    pub brands: Vec<Brand>,
    pub cycle: u64,
}

impl Snapshot {
    /// Looks up a product by id.
    pub fn product(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    /// Looks up a product by SKU (case-insensitive).
    pub fn product_by_sku(&self, sku: &str) -> Option<&Product> {
        self.products
            .iter()
            .find(|p| p.sku.eq_ignore_ascii_case(sku.trim()))
    }
}

// =============================================================================
// Form Payloads
// =============================================================================

/// Body for creating or updating a product.
///
/// Written with both the camelCase names and nothing else; the backend
/// accepts the legacy names on input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProductInput {
    pub name: String,
    pub sku: String,
    pub category: String,
    pub brand: String,
    pub price: Money,
    pub purchase_price: Money,
    pub stock: i64,
    pub min_stock: i64,
    pub description: String,
    pub image: Option<String>,
}

impl From<&Product> for ProductInput {
    fn from(p: &Product) -> Self {
        ProductInput {
            name: p.name.clone(),
            sku: p.sku.clone(),
            category: p.category.clone(),
            brand: p.brand.clone(),
            price: p.price,
            purchase_price: p.purchase_price,
            stock: p.stock,
            min_stock: p.min_stock,
            description: p.description.clone(),
            image: p.image.clone(),
        }
    }
}

/// Body for recording an expense.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ExpenseInput {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub description: String,
    pub amount: Money,
    pub category: String,
}

/// Body for creating or updating a staff account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UserInput {
    pub name: String,
    pub email: String,
    pub role: Role,
    /// Required on create, optional on update (unchanged when `None`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// Body for categories and brands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NamedInput {
    pub name: String,
}

// =============================================================================
// Unit Tests
// =============================================================================
