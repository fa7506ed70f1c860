//! # Reports
//!
//! Read-only aggregations over a [`Snapshot`] for the dashboard, products,
//! transactions and reports screens.
//!
//! Everything here is a pure function of the snapshot plus a date or a
//! filter. The dates are passed in so tests don't depend on the clock.
//!
//! ## Period Report
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  transactions in [from, to]          expenses in [from, to]            │
//! │         │                                     │                        │
//! │         ├── Σ total ─────────► revenue        │                        │
//! │         ├── Σ qty × purchase ► cost_of_goods  │                        │
//! │         │                                     │                        │
//! │         │   gross_profit = revenue − cost_of_goods                     │
//! │         │                                     ▼                        │
//! │         │                      Σ amount ──► expenses                   │
//! │         │                                                              │
//! │         │   net_profit = gross_profit − expenses                       │
//! │         │                                                              │
//! │         ├── group by payment method ──► by_payment_method              │
//! │         └── group by product ─────────► top_products                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{PaymentMethod, Product, Snapshot, Transaction};

/// Number of recent transactions on the dashboard.
pub const RECENT_TRANSACTIONS: usize = 5;

/// Number of rows in the top products table.
pub const TOP_PRODUCTS: usize = 5;

// =============================================================================
// Dashboard
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DashboardSummary {
    pub today_revenue: Money,
    pub today_transactions: usize,
    pub product_count: usize,
    pub low_stock: Vec<Product>,
    /// Newest first.
    pub recent_transactions: Vec<Transaction>,
}

impl DashboardSummary {
    /// Computes the dashboard cards for `today` (UTC calendar day).
    pub fn compute(snapshot: &Snapshot, today: NaiveDate) -> Self {
        let todays: Vec<&Transaction> = snapshot
            .transactions
            .iter()
            .filter(|t| t.date.date_naive() == today)
            .collect();

        let low_stock = snapshot
            .products
            .iter()
            .filter(|p| p.is_low_stock())
            .cloned()
            .collect();

        DashboardSummary {
            today_revenue: todays.iter().map(|t| t.total).sum(),
            today_transactions: todays.len(),
            product_count: snapshot.products.len(),
            low_stock,
            recent_transactions: recent_transactions(&snapshot.transactions, RECENT_TRANSACTIONS),
        }
    }
}

/// The `limit` newest transactions, newest first.
pub fn recent_transactions(transactions: &[Transaction], limit: usize) -> Vec<Transaction> {
    let mut sorted: Vec<&Transaction> = transactions.iter().collect();
    sorted.sort_by(|a, b| b.date.cmp(&a.date));
    sorted.into_iter().take(limit).cloned().collect()
}

// =============================================================================
// Product Filtering
// =============================================================================

/// Filter for the products screen. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProductFilter {
    /// Matched case-insensitively against name, SKU, and description.
    pub query: String,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub low_stock_only: bool,
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        let query = self.query.trim().to_lowercase();
        if !query.is_empty()
            && !product.name.to_lowercase().contains(&query)
            && !product.sku.to_lowercase().contains(&query)
            && !product.description.to_lowercase().contains(&query)
        {
            return false;
        }

        if let Some(category) = &self.category {
            if !product.category.eq_ignore_ascii_case(category.trim()) {
                return false;
            }
        }

        if let Some(brand) = &self.brand {
            if !product.brand.eq_ignore_ascii_case(brand.trim()) {
                return false;
            }
        }

        !self.low_stock_only || product.is_low_stock()
    }

    pub fn apply<'a>(&self, products: &'a [Product]) -> Vec<&'a Product> {
        products.iter().filter(|p| self.matches(p)).collect()
    }
}

// =============================================================================
// Transaction Filtering
// =============================================================================

/// Transactions whose date falls in `[from, to]` (inclusive calendar days,
/// UTC), newest first. `None` leaves that side open.
pub fn transactions_between(
    transactions: &[Transaction],
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Vec<&Transaction> {
    let mut matched: Vec<&Transaction> = transactions
        .iter()
        .filter(|t| in_range(t.date, from, to))
        .collect();
    matched.sort_by(|a, b| b.date.cmp(&a.date));
    matched
}

fn in_range(at: DateTime<Utc>, from: Option<NaiveDate>, to: Option<NaiveDate>) -> bool {
    let day = at.date_naive();
    from.map_or(true, |f| day >= f) && to.map_or(true, |t| day <= t)
}

fn day_in_range(day: NaiveDate, from: Option<NaiveDate>, to: Option<NaiveDate>) -> bool {
    from.map_or(true, |f| day >= f) && to.map_or(true, |t| day <= t)
}

// =============================================================================
// Period Report
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PaymentBreakdown {
    pub method: PaymentMethod,
    pub count: usize,
    pub total: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProductSales {
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub revenue: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PeriodReport {
    #[ts(as = "Option<String>")]
    pub from: Option<NaiveDate>,
    #[ts(as = "Option<String>")]
    pub to: Option<NaiveDate>,
    pub transaction_count: usize,
    pub revenue: Money,
    /// Purchase price × quantity of every line sold. Lines whose product is
    /// no longer in the catalog count as zero cost.
    pub cost_of_goods: Money,
    pub gross_profit: Money,
    pub expenses: Money,
    pub net_profit: Money,
    /// Gross margin in basis points.
    pub gross_margin_bps: i64,
    /// One row per payment method, in `PaymentMethod::ALL` order.
    pub by_payment_method: Vec<PaymentBreakdown>,
    /// Best sellers by quantity, then revenue.
    pub top_products: Vec<ProductSales>,
}

impl PeriodReport {
    pub fn compute(snapshot: &Snapshot, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        let transactions = transactions_between(&snapshot.transactions, from, to);

        let cost_by_product: HashMap<&str, Money> = snapshot
            .products
            .iter()
            .map(|p| (p.id.as_str(), p.purchase_price))
            .collect();

        let mut revenue = Money::zero();
        let mut cost_of_goods = Money::zero();
        let mut by_method: HashMap<PaymentMethod, (usize, Money)> = HashMap::new();
        let mut by_product: HashMap<&str, ProductSales> = HashMap::new();

        for tx in &transactions {
            revenue += tx.total;

            let entry = by_method.entry(tx.payment_method).or_default();
            entry.0 += 1;
            entry.1 += tx.total;

            for item in &tx.items {
                if let Some(cost) = cost_by_product.get(item.product_id.as_str()) {
                    cost_of_goods += cost.multiply_quantity(item.quantity);
                }

                let sales = by_product
                    .entry(item.product_id.as_str())
                    .or_insert_with(|| ProductSales {
                        product_id: item.product_id.clone(),
                        product_name: item.product_name.clone(),
                        quantity: 0,
                        revenue: Money::zero(),
                    });
                sales.quantity = sales.quantity.saturating_add(item.quantity);
                sales.revenue += item.subtotal;
            }
        }

        let expenses: Money = snapshot
            .expenses
            .iter()
            .filter(|e| day_in_range(e.date, from, to))
            .map(|e| e.amount)
            .sum();

        let by_payment_method = PaymentMethod::ALL
            .iter()
            .map(|m| {
                let (count, total) = by_method.get(m).copied().unwrap_or_default();
                PaymentBreakdown {
                    method: *m,
                    count,
                    total,
                }
            })
            .collect();

        let mut top_products: Vec<ProductSales> = by_product.into_values().collect();
        top_products.sort_by(|a, b| {
            b.quantity
                .cmp(&a.quantity)
                .then(b.revenue.cmp(&a.revenue))
                .then(a.product_name.cmp(&b.product_name))
        });
        top_products.truncate(TOP_PRODUCTS);

        let gross_profit = revenue - cost_of_goods;

        PeriodReport {
            from,
            to,
            transaction_count: transactions.len(),
            revenue,
            cost_of_goods,
            gross_profit,
            expenses,
            net_profit: gross_profit - expenses,
            gross_margin_bps: gross_profit.ratio_bps(revenue),
            by_payment_method,
            top_products,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Expense, TransactionItem};
    use chrono::TimeZone;

    fn product(id: &str, name: &str, price: i64, purchase: i64, stock: i64, min: i64) -> Product {
        Product {
            id: id.into(),
            name: name.into(),
            sku: format!("SKU-{}", id),
            category: "Smartphone".into(),
            brand: if id == "1" { "Apple".into() } else { "Samsung".into() },
            price: Money::new(price),
            purchase_price: Money::new(purchase),
            stock,
            min_stock: min,
            description: String::new(),
            image: None,
        }
    }

    fn tx(id: &str, day: u32, hour: u32, method: PaymentMethod, items: Vec<TransactionItem>) -> Transaction {
        let total = items.iter().map(|i| i.subtotal).sum();
        Transaction {
            id: id.into(),
            date: Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap(),
            items,
            total,
            cashier_id: "2".into(),
            cashier_name: "Kasir".into(),
            payment_method: method,
        }
    }

    fn snapshot() -> Snapshot {
        Snapshot {
            products: vec![
                product("1", "iPhone 15", 1000, 800, 2, 5),
                product("2", "Galaxy S24", 500, 300, 20, 5),
            ],
            transactions: vec![
                tx("t1", 1, 9, PaymentMethod::Cash, vec![TransactionItem::new("1", "iPhone 15", 1, Money::new(1000))]),
                tx("t2", 2, 10, PaymentMethod::Card, vec![TransactionItem::new("2", "Galaxy S24", 3, Money::new(500))]),
                tx(
                    "t3",
                    2,
                    15,
                    PaymentMethod::Cash,
                    vec![
                        TransactionItem::new("1", "iPhone 15", 1, Money::new(1000)),
                        TransactionItem::new("9", "Discontinued", 1, Money::new(100)),
                    ],
                ),
            ],
            expenses: vec![
                Expense {
                    id: "e1".into(),
                    date: NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
                    description: "Listrik".into(),
                    amount: Money::new(200),
                    category: "Utilities".into(),
                },
                Expense {
                    id: "e2".into(),
                    date: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
                    description: "Sewa".into(),
                    amount: Money::new(5000),
                    category: "Rent".into(),
                },
            ],
            ..Snapshot::default()
        }
    }

    fn march(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    #[test]
    fn test_dashboard_summary() {
        let summary = DashboardSummary::compute(&snapshot(), march(2));

        assert_eq!(summary.today_transactions, 2);
        assert_eq!(summary.today_revenue.amount(), 1500 + 1100);
        assert_eq!(summary.product_count, 2);
        assert_eq!(summary.low_stock.len(), 1);
        assert_eq!(summary.low_stock[0].id, "1");

        let ids: Vec<&str> = summary.recent_transactions.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["t3", "t2", "t1"]);
    }

    #[test]
    fn test_dashboard_on_empty_snapshot() {
        let summary = DashboardSummary::compute(&Snapshot::default(), march(2));
        assert_eq!(summary.today_revenue, Money::zero());
        assert!(summary.recent_transactions.is_empty());
        assert!(summary.low_stock.is_empty());
    }

    #[test]
    fn test_period_report() {
        let report = PeriodReport::compute(&snapshot(), Some(march(1)), Some(march(31)));

        assert_eq!(report.transaction_count, 3);
        assert_eq!(report.revenue.amount(), 1000 + 1500 + 1100);
        // 800 + 3×300 + 800; the discontinued line has no known cost
        assert_eq!(report.cost_of_goods.amount(), 2500);
        assert_eq!(report.gross_profit.amount(), 1100);
        assert_eq!(report.expenses.amount(), 200);
        assert_eq!(report.net_profit.amount(), 900);

        let cash = &report.by_payment_method[0];
        assert_eq!(cash.method, PaymentMethod::Cash);
        assert_eq!(cash.count, 2);
        assert_eq!(cash.total.amount(), 2100);
        assert_eq!(report.by_payment_method[2].count, 0);

        assert_eq!(report.top_products[0].product_id, "2");
        assert_eq!(report.top_products[0].quantity, 3);
        assert_eq!(report.top_products[1].product_id, "1");
        assert_eq!(report.top_products[1].revenue.amount(), 2000);
    }

    #[test]
    fn test_period_report_range_is_inclusive() {
        let report = PeriodReport::compute(&snapshot(), Some(march(2)), Some(march(2)));
        assert_eq!(report.transaction_count, 2);
        assert_eq!(report.expenses.amount(), 200);

        let open = PeriodReport::compute(&snapshot(), None, None);
        assert_eq!(open.expenses.amount(), 5200);
        assert!(open.net_profit.is_negative());
    }

    #[test]
    fn test_product_filter() {
        let snap = snapshot();

        let by_text = ProductFilter {
            query: "galaxy".into(),
            ..ProductFilter::default()
        };
        assert_eq!(by_text.apply(&snap.products).len(), 1);

        let by_brand = ProductFilter {
            brand: Some("apple".into()),
            ..ProductFilter::default()
        };
        assert_eq!(by_brand.apply(&snap.products)[0].id, "1");

        let low = ProductFilter {
            low_stock_only: true,
            ..ProductFilter::default()
        };
        assert_eq!(low.apply(&snap.products).len(), 1);

        assert_eq!(ProductFilter::default().apply(&snap.products).len(), 2);
    }

    #[test]
    fn test_transactions_between() {
        let snap = snapshot();
        let day_one = transactions_between(&snap.transactions, Some(march(1)), Some(march(1)));
        assert_eq!(day_one.len(), 1);
        assert_eq!(day_one[0].id, "t1");

        let from_two = transactions_between(&snap.transactions, Some(march(2)), None);
        assert_eq!(from_two.len(), 2);
        assert_eq!(from_two[0].id, "t3");
    }
}
