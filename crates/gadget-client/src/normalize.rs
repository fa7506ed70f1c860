//! # Payload Normalization
//!
//! Turns raw backend JSON into domain types.
//!
//! The backend has been through several revisions and its payloads show it:
//! ids are numbers or strings, amounts are integers, floats or decimal
//! strings, and field names come in camelCase or snake_case. Every rule for
//! coping with that lives here.
//!
//! ## Product Field Precedence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  purchasePrice (legacy)  ── present & numeric? ──► use it               │
//! │          │ no                                                           │
//! │          ▼                                                              │
//! │  buy_price (native)      ── present & numeric? ──► use it               │
//! │          │ no                                                           │
//! │          ▼                                                              │
//! │  0                                                                      │
//! │                                                                         │
//! │  minStock → min_stock → 0 follows the same chain.                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Failure Policy
//! A record that can't be normalized fails the whole collection it came in.
//! The aggregate then degrades that one collection to empty for the cycle
//! rather than showing a partial list that looks complete.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use gadget_core::{
    Brand, Category, Expense, Money, PaymentMethod, Product, Transaction, TransactionItem, User,
};
use serde_json::{Map, Value};

use crate::error::{ClientError, ClientResult};

type Record = Map<String, Value>;

// =============================================================================
// Collections
// =============================================================================

pub fn products(raw: &Value) -> ClientResult<Vec<Product>> {
    collection("products", raw, product_record)
}

pub fn transactions(raw: &Value) -> ClientResult<Vec<Transaction>> {
    collection("transactions", raw, transaction_record)
}

pub fn expenses(raw: &Value) -> ClientResult<Vec<Expense>> {
    collection("expenses", raw, expense_record)
}

pub fn users(raw: &Value) -> ClientResult<Vec<User>> {
    collection("users", raw, user_record)
}

pub fn categories(raw: &Value) -> ClientResult<Vec<Category>> {
    collection("categories", raw, |r| {
        let (id, name) = named_record(r)?;
        Ok(Category { id, name })
    })
}

pub fn brands(raw: &Value) -> ClientResult<Vec<Brand>> {
    collection("brands", raw, |r| {
        let (id, name) = named_record(r)?;
        Ok(Brand { id, name })
    })
}

// =============================================================================
// Single Records
// =============================================================================

pub fn product(raw: &Value) -> ClientResult<Product> {
    single("product", raw, product_record)
}

/// The `user` object of a login response, or one row of `/users`.
pub fn user(raw: &Value) -> ClientResult<User> {
    single("user", raw, user_record)
}

pub fn transaction(raw: &Value) -> ClientResult<Transaction> {
    single("transaction", raw, transaction_record)
}

fn collection<T>(
    resource: &str,
    raw: &Value,
    parse: impl Fn(&Record) -> Result<T, String>,
) -> ClientResult<Vec<T>> {
    let rows = match raw {
        Value::Null => return Ok(Vec::new()),
        Value::Array(rows) => rows,
        other => {
            return Err(invalid(
                resource,
                format!("expected an array, got {}", kind(other)),
            ))
        }
    };

    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            let record = row
                .as_object()
                .ok_or_else(|| invalid(resource, format!("row {} is {}", i, kind(row))))?;
            parse(record).map_err(|reason| invalid(resource, format!("row {}: {}", i, reason)))
        })
        .collect()
}

fn single<T>(
    resource: &str,
    raw: &Value,
    parse: impl Fn(&Record) -> Result<T, String>,
) -> ClientResult<T> {
    let record = raw
        .as_object()
        .ok_or_else(|| invalid(resource, format!("expected an object, got {}", kind(raw))))?;
    parse(record).map_err(|reason| invalid(resource, reason))
}

fn invalid(resource: &str, reason: String) -> ClientError {
    ClientError::InvalidPayload {
        resource: resource.to_string(),
        reason,
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// =============================================================================
// Record Parsers
// =============================================================================

fn product_record(r: &Record) -> Result<Product, String> {
    let price = number_or_zero(r, &["price", "sell_price", "selling_price"]);
    let stock = number_or_zero(r, &["stock"]);
    if price < 0 {
        return Err("price must not be negative".into());
    }
    if stock < 0 {
        return Err("stock must not be negative".into());
    }

    Ok(Product {
        id: required_id(r)?,
        name: required_text(r, &["name"])?,
        sku: text(r, &["sku"]).unwrap_or_default(),
        category: label(r, "category", "category_name"),
        brand: label(r, "brand", "brand_name"),
        price: Money::new(price),
        purchase_price: Money::new(number_or_zero(r, &["purchasePrice", "buy_price", "purchase_price"])),
        stock,
        min_stock: number_or_zero(r, &["minStock", "min_stock"]),
        description: text(r, &["description"]).unwrap_or_default(),
        image: text(r, &["image", "image_url"]).filter(|s| !s.is_empty()),
    })
}

fn transaction_record(r: &Record) -> Result<Transaction, String> {
    let date_raw = field(r, &["date", "created_at", "createdAt"]).ok_or("missing date")?;
    let date = datetime(date_raw).ok_or_else(|| format!("unreadable date {}", date_raw))?;

    let items = match field(r, &["items", "transaction_items"]) {
        None => Vec::new(),
        Some(Value::Array(rows)) => rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                row.as_object()
                    .ok_or_else(|| format!("item {} is {}", i, kind(row)))
                    .and_then(item_record)
                    .map_err(|e| format!("item {}: {}", i, e))
            })
            .collect::<Result<Vec<_>, _>>()?,
        Some(other) => return Err(format!("items is {}", kind(other))),
    };

    let payment_method = match text(r, &["paymentMethod", "payment_method"]) {
        None => PaymentMethod::Cash,
        Some(raw) => raw.parse()?,
    };

    let cashier_name = text(r, &["cashierName", "cashier_name"])
        .or_else(|| nested_name(r, &["cashier", "user"]))
        .unwrap_or_default();

    let mut tx = Transaction {
        id: required_id(r)?,
        date,
        items,
        total: Money::zero(),
        cashier_id: field(r, &["cashierId", "cashier_id", "user_id"])
            .and_then(id)
            .unwrap_or_default(),
        cashier_name,
        payment_method,
    };

    let computed = tx.checked_total().ok_or("amount overflows")?;
    tx.total = match field(r, &["total", "total_amount"]) {
        None => computed,
        Some(v) => Money::new(number(v).ok_or_else(|| format!("total is {}", kind(v)))?),
    };
    tx.verify_total().map_err(|e| e.to_string())?;

    Ok(tx)
}

fn item_record(r: &Record) -> Result<TransactionItem, String> {
    let quantity = field(r, &["quantity", "qty"])
        .and_then(number)
        .ok_or("missing quantity")?;
    if quantity <= 0 {
        return Err("quantity must be positive".into());
    }
    let price = field(r, &["price", "unit_price"])
        .and_then(number)
        .ok_or("missing price")?;
    if price < 0 {
        return Err("price must not be negative".into());
    }

    let product_id = field(r, &["productId", "product_id"])
        .and_then(id)
        .ok_or("missing productId")?;
    let product_name = text(r, &["productName", "product_name", "name"])
        .or_else(|| nested_name(r, &["product"]))
        .unwrap_or_default();

    Money::new(price)
        .checked_mul(quantity)
        .ok_or("amount overflows")?;
    let item = TransactionItem::new(product_id, product_name, quantity, Money::new(price));

    if let Some(v) = field(r, &["subtotal"]) {
        let given = number(v).ok_or_else(|| format!("subtotal is {}", kind(v)))?;
        if given != item.subtotal.amount() {
            return Err(format!(
                "subtotal {} does not match quantity × price {}",
                given,
                item.subtotal.amount()
            ));
        }
    }

    Ok(item)
}

fn expense_record(r: &Record) -> Result<Expense, String> {
    let date_raw = field(r, &["date", "expense_date"]).ok_or("missing date")?;
    let date = date(date_raw).ok_or_else(|| format!("unreadable date {}", date_raw))?;

    let amount = number_or_zero(r, &["amount"]);
    if amount < 0 {
        return Err("amount must not be negative".into());
    }

    Ok(Expense {
        id: required_id(r)?,
        date,
        description: text(r, &["description"]).unwrap_or_default(),
        amount: Money::new(amount),
        category: label(r, "category", "category_name"),
    })
}

fn user_record(r: &Record) -> Result<User, String> {
    Ok(User {
        id: required_id(r)?,
        name: required_text(r, &["name"])?,
        email: text(r, &["email"]).unwrap_or_default(),
        role: text(r, &["role"]).unwrap_or_default(),
    })
}

fn named_record(r: &Record) -> Result<(String, String), String> {
    Ok((required_id(r)?, required_text(r, &["name"])?))
}

// =============================================================================
// Field Helpers
// =============================================================================

/// First of `names` that is present and not null.
fn field<'a>(r: &'a Record, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .filter_map(|n| r.get(*n))
        .find(|v| !v.is_null())
}

/// Integer from a JSON number (floats rounded) or a numeric string.
fn number(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.round() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(|f| f.round() as i64)
            })
        }
        _ => None,
    }
}

/// First of `names` that holds a usable number; 0 when none does.
fn number_or_zero(r: &Record, names: &[&str]) -> i64 {
    names
        .iter()
        .filter_map(|n| r.get(*n))
        .find_map(number)
        .unwrap_or(0)
}

fn id(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

fn required_id(r: &Record) -> Result<String, String> {
    field(r, &["id", "_id"])
        .and_then(id)
        .ok_or_else(|| "missing id".to_string())
}

fn text(r: &Record, names: &[&str]) -> Option<String> {
    match field(r, names)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn required_text(r: &Record, names: &[&str]) -> Result<String, String> {
    text(r, names)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| format!("missing {}", names[0]))
}

fn nested_name(r: &Record, names: &[&str]) -> Option<String> {
    field(r, names)?
        .get("name")
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// A string, a `{name}` object, or the flat `*_name` column.
fn label(r: &Record, key: &str, flat: &str) -> String {
    match r.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Object(obj)) => obj
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        _ => text(r, &[flat]).unwrap_or_default(),
    }
}

/// RFC 3339, `YYYY-MM-DD HH:MM:SS` (taken as UTC), or a bare date (midnight UTC).
fn datetime(value: &Value) -> Option<DateTime<Utc>> {
    let s = value.as_str()?.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn date(value: &Value) -> Option<NaiveDate> {
    let s = value.as_str()?.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| datetime(value).map(|dt| dt.date_naive()))
}

// =============================================================================
// Unit Tests
// =============================================================================
