//! # Validation Module
//!
//! Input validation for the CRUD dialogs.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Form (web front end)                                         │
//! │  ├── Basic format checks (empty, length)                               │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: gadget-client mutation                                       │
//! │  └── THIS MODULE: rule checks against the current snapshot             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Backend API                                                  │
//! │  └── Authoritative checks; its message is shown verbatim on failure    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use gadget_core::validation::{validate_sku, validate_quantity};
//!
//! assert!(validate_sku("IPH-15-128").is_ok());
//! assert!(validate_quantity(5).is_ok());
//! ```

use crate::error::ValidationError;
use crate::types::{ExpenseInput, NamedInput, Product, ProductInput, UserInput};
use crate::MAX_ITEM_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a SKU (Stock Keeping Unit).
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Only alphanumeric characters, hyphens, underscores
///
/// ## Example
/// ```rust
/// use gadget_core::validation::validate_sku;
///
/// assert!(validate_sku("SAM-S24").is_ok());
/// assert!(validate_sku("").is_err());
/// assert!(validate_sku("has space").is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::Required {
            field: "sku".to_string(),
        });
    }

    if sku.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: 50,
        });
    }

    if !sku
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a required name-like field (product, category, brand, user).
pub fn validate_name(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates an email address.
///
/// Only the shape is checked (one `@`, non-empty local part, a dot in the
/// domain). The backend owns the real check.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::Required {
            field: "email".to_string(),
        });
    }

    let invalid = || ValidationError::InvalidFormat {
        field: "email".to_string(),
        reason: "must look like name@domain.tld".to_string(),
    };

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty()
        || domain.contains('@')
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
        || email.contains(char::is_whitespace)
    {
        return Err(invalid());
    }

    Ok(())
}

/// Validates a search query and returns it trimmed.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a cart quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates that an amount or count is not negative. Zero is allowed.
pub fn validate_non_negative(field: &str, value: i64) -> ValidationResult<()> {
    if value < 0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Form Validators
// =============================================================================

/// Validates a product form against the current catalog.
///
/// `editing_id` is the id of the product being edited, so that it doesn't
/// collide with its own SKU.
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Products: Save dialog                                                  │
/// │                                                                         │
/// │  validate_product(&input, &snapshot.products, Some("7"))               │
/// │       │                                                                 │
/// │       ├── name empty?        → "name is required"                       │
/// │       ├── sku malformed?     → "sku has invalid format: ..."            │
/// │       ├── sku taken by #3?   → "sku 'IPH-15' already exists"            │
/// │       ├── price/stock < 0?   → "price must not be negative"             │
/// │       │                                                                 │
/// │       └── OK → PUT /products/7                                          │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_product(
    input: &ProductInput,
    catalog: &[Product],
    editing_id: Option<&str>,
) -> ValidationResult<()> {
    validate_name("name", &input.name, 200)?;
    validate_sku(&input.sku)?;

    let sku = input.sku.trim();
    let taken = catalog
        .iter()
        .filter(|p| Some(p.id.as_str()) != editing_id)
        .any(|p| p.sku.trim().eq_ignore_ascii_case(sku));
    if taken {
        return Err(ValidationError::Duplicate {
            field: "sku".to_string(),
            value: sku.to_string(),
        });
    }

    validate_non_negative("price", input.price.amount())?;
    validate_non_negative("purchasePrice", input.purchase_price.amount())?;
    validate_non_negative("stock", input.stock)?;
    validate_non_negative("minStock", input.min_stock)?;

    Ok(())
}

/// Validates an expense form.
pub fn validate_expense(input: &ExpenseInput) -> ValidationResult<()> {
    validate_name("description", &input.description, 500)?;
    validate_non_negative("amount", input.amount.amount())?;
    validate_name("category", &input.category, 100)?;
    Ok(())
}

/// Validates a staff account form.
///
/// A password is mandatory when creating (`creating = true`) and must be at
/// least 6 characters whenever it is supplied.
pub fn validate_user(input: &UserInput, creating: bool) -> ValidationResult<()> {
    validate_name("name", &input.name, 100)?;
    validate_email(&input.email)?;

    match input.password.as_deref() {
        None if creating => {
            return Err(ValidationError::Required {
                field: "password".to_string(),
            })
        }
        Some(pw) if pw.chars().count() < 6 => {
            return Err(ValidationError::InvalidFormat {
                field: "password".to_string(),
                reason: "must be at least 6 characters".to_string(),
            })
        }
        _ => {}
    }

    Ok(())
}

/// Validates a category or brand form.
pub fn validate_named(field: &str, input: &NamedInput) -> ValidationResult<()> {
    validate_name(field, &input.name, 100)
}

// =============================================================================
// Unit Tests
// =============================================================================
