//! # Cart
//!
//! The cashier's working cart on the transactions screen, and checkout into
//! an immutable transaction.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Frontend Action          Cart Method             Change                │
//! │  ───────────────          ───────────             ──────                │
//! │                                                                         │
//! │  Click Product ──────────► add_item() ──────────► push / qty += n      │
//! │  Change Quantity ────────► update_quantity() ───► items[i].qty = n     │
//! │  Click Remove ───────────► remove_item() ───────► items.remove(i)      │
//! │  Click Pay ──────────────► checkout() ──────────► NewTransaction       │
//! │                                                                         │
//! │  Stock is checked against the product as it was when added; the       │
//! │  backend re-checks on POST /transactions.                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Identity, NewTransaction, PaymentMethod, Product, TransactionItem};
use crate::validation::validate_quantity;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

/// An item in the cart.
///
/// ## Design Notes
/// Name, SKU and price are frozen copies taken when the product was added,
/// so a refresh of the product list mid-sale doesn't change the price the
/// customer was quoted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartItem {
    pub product_id: String,
    pub sku: String,
    pub name: String,
    pub unit_price: Money,
    pub quantity: i64,
    /// Stock on hand when the product was added.
    pub available_stock: i64,
}

impl CartItem {
    pub fn from_product(product: &Product, quantity: i64) -> Self {
        CartItem {
            product_id: product.id.clone(),
            sku: product.sku.clone(),
            name: product.name.clone(),
            unit_price: product.price,
            quantity,
            available_stock: product.stock,
        }
    }

    /// `unit_price × quantity`.
    pub fn subtotal(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

/// The shopping cart.
///
/// ## Invariants
/// - Items are unique by `product_id` (adding the same product increases quantity)
/// - 0 < quantity ≤ min(stock, MAX_ITEM_QUANTITY)
/// - At most MAX_CART_ITEMS lines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Cart {
    pub items: Vec<CartItem>,
    pub payment_method: PaymentMethod,
}

impl Default for Cart {
    fn default() -> Self {
        Cart {
            items: Vec::new(),
            payment_method: PaymentMethod::Cash,
        }
    }
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a product or increases its quantity.
    pub fn add_item(&mut self, product: &Product, quantity: i64) -> CoreResult<()> {
        validate_quantity(quantity)?;

        if let Some(item) = self.items.iter_mut().find(|i| i.product_id == product.id) {
            let new_qty = item.quantity + quantity;
            check_quantity(&product.sku, product.stock, new_qty)?;
            item.quantity = new_qty;
            item.available_stock = product.stock;
            return Ok(());
        }

        if self.items.len() >= MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_ITEMS,
            });
        }

        check_quantity(&product.sku, product.stock, quantity)?;
        self.items.push(CartItem::from_product(product, quantity));
        Ok(())
    }

    /// Sets the quantity of a line. Zero removes it.
    pub fn update_quantity(&mut self, product_id: &str, quantity: i64) -> CoreResult<()> {
        if quantity == 0 {
            return self.remove_item(product_id);
        }
        validate_quantity(quantity)?;

        let item = self
            .items
            .iter_mut()
            .find(|i| i.product_id == product_id)
            .ok_or_else(|| CoreError::NotInCart(product_id.to_string()))?;

        check_quantity(&item.sku, item.available_stock, quantity)?;
        item.quantity = quantity;
        Ok(())
    }

    pub fn remove_item(&mut self, product_id: &str) -> CoreResult<()> {
        let initial_len = self.items.len();
        self.items.retain(|i| i.product_id != product_id);

        if self.items.len() == initial_len {
            Err(CoreError::NotInCart(product_id.to_string()))
        } else {
            Ok(())
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.payment_method = PaymentMethod::Cash;
    }

    pub fn set_payment_method(&mut self, method: PaymentMethod) {
        self.payment_method = method;
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Sum of line subtotals. There is no tax or discount line.
    pub fn total(&self) -> Money {
        self.items.iter().map(CartItem::subtotal).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Builds the transaction to submit for this cart.
    ///
    /// The cart is left untouched; the caller clears it once the backend has
    /// accepted the transaction.
    pub fn checkout(&self, cashier: &Identity, at: DateTime<Utc>) -> CoreResult<NewTransaction> {
        if self.is_empty() {
            return Err(CoreError::EmptyCart);
        }

        let items: Vec<TransactionItem> = self
            .items
            .iter()
            .map(|i| TransactionItem::new(&i.product_id, &i.name, i.quantity, i.unit_price))
            .collect();
        let total = items.iter().map(|i| i.subtotal).sum();

        Ok(NewTransaction {
            date: at,
            items,
            total,
            cashier_id: cashier.id.clone(),
            cashier_name: cashier.name.clone(),
            payment_method: self.payment_method,
        })
    }
}

fn check_quantity(sku: &str, stock: i64, requested: i64) -> CoreResult<()> {
    if requested > MAX_ITEM_QUANTITY {
        return Err(CoreError::QuantityTooLarge {
            requested,
            max: MAX_ITEM_QUANTITY,
        });
    }
    if requested > stock {
        return Err(CoreError::InsufficientStock {
            sku: sku.to_string(),
            available: stock,
            requested,
        });
    }
    Ok(())
}

/// Cart totals summary for the front end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartTotals {
    pub item_count: usize,
    pub total_quantity: i64,
    pub total: Money,
}

impl From<&Cart> for CartTotals {
    fn from(cart: &Cart) -> Self {
        CartTotals {
            item_count: cart.item_count(),
            total_quantity: cart.total_quantity(),
            total: cart.total(),
        }
    }
}
