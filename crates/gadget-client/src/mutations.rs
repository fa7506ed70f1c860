//! # Mutations
//!
//! Every write the view modules make: product, expense, user, category and
//! brand CRUD plus checkout.
//!
//! ## Mutation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create_product(input)                                                  │
//! │      │                                                                  │
//! │      ├── role may use the owning section?   no ──► Notice::error        │
//! │      ├── validate against the snapshot      err ─► Notice::error        │
//! │      ├── POST /products                     err ─► Notice::error        │
//! │      │                                             (backend message)    │
//! │      ├── context.refresh()                                              │
//! │      └── Notice::success                                                │
//! │                                                                         │
//! │  Nothing is written into the snapshot locally. A failed mutation        │
//! │  leaves it exactly as it was; a successful one shows up only through    │
//! │  the refresh.                                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use gadget_core::navigation::can_view;
use gadget_core::validation::{validate_expense, validate_named, validate_product, validate_user};
use gadget_core::{Cart, ExpenseInput, Identity, NamedInput, ProductInput, Section, UserInput};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::aggregate::DataContext;
use crate::error::{ClientError, ClientResult};
use crate::gateway::{Backend, Resource};
use crate::notice::Notice;
use crate::session::SessionHandle;

pub struct Mutations {
    backend: Arc<dyn Backend>,
    session: SessionHandle,
    context: Arc<DataContext>,
}

impl Mutations {
    pub fn new(backend: Arc<dyn Backend>, session: SessionHandle, context: Arc<DataContext>) -> Self {
        Mutations {
            backend,
            session,
            context,
        }
    }

    // =========================================================================
    // Products
    // =========================================================================

    pub async fn create_product(&self, input: ProductInput) -> Notice {
        self.perform("create_product", async {
            self.require(Section::Products).await?;
            validate_product(&input, &self.context.snapshot().products, None)?;
            self.backend
                .create(Resource::Products, to_body(&input)?)
                .await?;
            Ok::<_, ClientError>(format!("Product {} added", input.name.trim()))
        })
        .await
    }

    pub async fn update_product(&self, id: &str, input: ProductInput) -> Notice {
        self.perform("update_product", async {
            self.require(Section::Products).await?;
            validate_product(&input, &self.context.snapshot().products, Some(id))?;
            self.backend
                .update(Resource::Products, id, to_body(&input)?)
                .await?;
            Ok::<_, ClientError>(format!("Product {} updated", input.name.trim()))
        })
        .await
    }

    pub async fn delete_product(&self, id: &str) -> Notice {
        self.perform("delete_product", async {
            self.require(Section::Products).await?;
            self.backend.delete(Resource::Products, id).await?;
            Ok::<_, ClientError>("Product deleted".to_string())
        })
        .await
    }

    // =========================================================================
    // Transactions
    // =========================================================================

    /// Submits the cart as a transaction. The cart is cleared only when the
    /// backend accepts it.
    pub async fn checkout(&self, cart: &mut Cart) -> Notice {
        let notice = self
            .perform("checkout", async {
                let cashier = self.require(Section::Transactions).await?;
                let tx = cart.checkout(&cashier, Utc::now())?;
                self.backend
                    .create(Resource::Transactions, to_body(&tx)?)
                    .await?;
                Ok::<_, ClientError>(format!("Transaction saved, total {}", tx.total))
            })
            .await;

        if notice.is_success() {
            cart.clear();
        }
        notice
    }

    // =========================================================================
    // Expenses
    // =========================================================================

    pub async fn record_expense(&self, input: ExpenseInput) -> Notice {
        self.perform("record_expense", async {
            self.require(Section::Settings).await?;
            validate_expense(&input)?;
            self.backend
                .create(Resource::Expenses, to_body(&input)?)
                .await?;
            Ok::<_, ClientError>(format!("Expense recorded: {}", input.amount))
        })
        .await
    }

    pub async fn delete_expense(&self, id: &str) -> Notice {
        self.perform("delete_expense", async {
            self.require(Section::Settings).await?;
            self.backend.delete(Resource::Expenses, id).await?;
            Ok::<_, ClientError>("Expense deleted".to_string())
        })
        .await
    }

    // =========================================================================
    // Users
    // =========================================================================

    pub async fn create_user(&self, input: UserInput) -> Notice {
        self.perform("create_user", async {
            self.require(Section::Settings).await?;
            validate_user(&input, true)?;
            self.backend.create(Resource::Users, to_body(&input)?).await?;
            Ok::<_, ClientError>(format!("User {} added", input.name.trim()))
        })
        .await
    }

    pub async fn update_user(&self, id: &str, input: UserInput) -> Notice {
        self.perform("update_user", async {
            self.require(Section::Settings).await?;
            validate_user(&input, false)?;
            self.backend
                .update(Resource::Users, id, to_body(&input)?)
                .await?;
            Ok::<_, ClientError>(format!("User {} updated", input.name.trim()))
        })
        .await
    }

    pub async fn delete_user(&self, id: &str) -> Notice {
        self.perform("delete_user", async {
            let me = self.require(Section::Settings).await?;
            if me.id == id {
                return Err(ClientError::InvalidState(
                    "You cannot delete your own account".into(),
                ));
            }
            self.backend.delete(Resource::Users, id).await?;
            Ok::<_, ClientError>("User deleted".to_string())
        })
        .await
    }

    // =========================================================================
    // Categories & Brands
    // =========================================================================

    pub async fn create_category(&self, input: NamedInput) -> Notice {
        self.save_named(Resource::Categories, "category", None, input).await
    }

    pub async fn update_category(&self, id: &str, input: NamedInput) -> Notice {
        self.save_named(Resource::Categories, "category", Some(id), input).await
    }

    pub async fn delete_category(&self, id: &str) -> Notice {
        self.delete_named(Resource::Categories, "Category", id).await
    }

    pub async fn create_brand(&self, input: NamedInput) -> Notice {
        self.save_named(Resource::Brands, "brand", None, input).await
    }

    pub async fn update_brand(&self, id: &str, input: NamedInput) -> Notice {
        self.save_named(Resource::Brands, "brand", Some(id), input).await
    }

    pub async fn delete_brand(&self, id: &str) -> Notice {
        self.delete_named(Resource::Brands, "Brand", id).await
    }

    async fn save_named(
        &self,
        resource: Resource,
        field: &str,
        id: Option<&str>,
        input: NamedInput,
    ) -> Notice {
        self.perform("save_named", async {
            self.require(Section::Settings).await?;
            validate_named(field, &input)?;
            let body = to_body(&input)?;
            match id {
                Some(id) => self.backend.update(resource, id, body).await?,
                None => self.backend.create(resource, body).await?,
            };
            Ok::<_, ClientError>(format!("{} saved", input.name.trim()))
        })
        .await
    }

    async fn delete_named(&self, resource: Resource, label: &str, id: &str) -> Notice {
        self.perform("delete_named", async {
            self.require(Section::Settings).await?;
            self.backend.delete(resource, id).await?;
            Ok::<_, ClientError>(format!("{} deleted", label))
        })
        .await
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// The signed-in identity, if its role may use `section`.
    async fn require(&self, section: Section) -> ClientResult<Identity> {
        let identity = self
            .session
            .identity()
            .await
            .ok_or(ClientError::NotAuthenticated)?;
        if !can_view(identity.role(), section) {
            return Err(ClientError::Unauthorized {
                message: Some(format!(
                    "Your role cannot change {}",
                    section.menu_item().label
                )),
            });
        }
        Ok(identity)
    }

    /// Runs `op`; refreshes and reports success, or reports the failure.
    async fn perform(
        &self,
        action: &'static str,
        op: impl Future<Output = ClientResult<String>>,
    ) -> Notice {
        match op.await {
            Ok(message) => {
                info!(action, "Mutation succeeded");
                let outcome = self.context.refresh().await;
                if !outcome.failed.is_empty() {
                    warn!(action, failed = ?outcome.failed, "Refresh after mutation was partial");
                }
                Notice::success(message)
            }
            Err(e) => {
                warn!(action, error = %e, "Mutation failed");
                Notice::error(e.user_message())
            }
        }
    }
}

fn to_body<T: Serialize>(value: &T) -> ClientResult<Value> {
    Ok(serde_json::to_value(value)?)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notice::NoticeLevel;
    use crate::session::SessionStore;
    use crate::storage::MemoryStorage;
    use crate::testing::{admin_identity, FakeBackend};
    use chrono::NaiveDate;
    use gadget_core::{Money, Role};

    struct Harness {
        backend: Arc<FakeBackend>,
        session: SessionHandle,
        context: Arc<DataContext>,
        mutations: Mutations,
    }

    async fn harness(identity: Option<Identity>) -> Harness {
        let backend = Arc::new(FakeBackend::seeded());
        let session = Arc::new(SessionStore::new(Arc::new(MemoryStorage::new())));
        if let Some(identity) = identity {
            session.establish(identity).await.unwrap();
        }
        let context = Arc::new(DataContext::new(backend.clone(), session.clone()));
        context.load().await;
        let mutations = Mutations::new(backend.clone(), session.clone(), context.clone());
        Harness {
            backend,
            session,
            context,
            mutations,
        }
    }

    fn cashier() -> Identity {
        Identity {
            id: "2".into(),
            name: "Kasir".into(),
            email: "kasir@gadgetprima.com".into(),
            role: "cashier".into(),
            token: "token-2".into(),
        }
    }

    fn pixel() -> ProductInput {
        ProductInput {
            name: "Pixel 8".into(),
            sku: "PXL-8".into(),
            category: "Smartphone".into(),
            brand: "Google".into(),
            price: Money::new(10_999_000),
            purchase_price: Money::new(9_800_000),
            stock: 5,
            min_stock: 1,
            description: String::new(),
            image: None,
        }
    }

    #[tokio::test]
    async fn test_create_product_then_refresh_has_it_once() {
        let h = harness(Some(admin_identity())).await;

        let notice = h.mutations.create_product(pixel()).await;
        assert!(notice.is_success(), "{}", notice);

        let snap = h.context.snapshot();
        assert_eq!(snap.products.len(), 3);
        assert_eq!(snap.products.iter().filter(|p| p.sku == "PXL-8").count(), 1);
        assert_eq!(snap.cycle, 2);

        // A second refresh doesn't duplicate it either
        h.context.refresh().await;
        assert_eq!(h.context.snapshot().products.len(), 3);
    }

    #[tokio::test]
    async fn test_backend_failure_leaves_snapshot_untouched() {
        let h = harness(Some(admin_identity())).await;
        h.backend.fail_writes(Resource::Products, "SKU sudah digunakan");
        let before = h.context.snapshot();

        let notice = h.mutations.create_product(pixel()).await;
        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(notice.message, "SKU sudah digunakan");
        assert!(Arc::ptr_eq(&before, &h.context.snapshot()));
    }

    #[tokio::test]
    async fn test_validation_failure_never_reaches_backend() {
        let h = harness(Some(admin_identity())).await;
        let mut dup = pixel();
        dup.sku = "iph-15".into();

        let notice = h.mutations.create_product(dup).await;
        assert!(!notice.is_success());
        assert_eq!(notice.message, "sku 'iph-15' already exists");
        assert_eq!(h.backend.write_calls(), 0);
    }

    #[tokio::test]
    async fn test_update_product_keeps_own_sku() {
        let h = harness(Some(admin_identity())).await;
        let existing = h.context.snapshot().product("1").cloned().unwrap();
        let mut input = ProductInput::from(&existing);
        input.stock = 40;

        assert!(h.mutations.update_product("1", input).await.is_success());
        assert_eq!(h.context.snapshot().product("1").unwrap().stock, 40);
    }

    #[tokio::test]
    async fn test_cashier_cannot_edit_products() {
        let h = harness(Some(cashier())).await;
        let notice = h.mutations.delete_product("1").await;
        assert!(!notice.is_success());
        assert!(notice.message.contains("Products"));
        assert_eq!(h.backend.write_calls(), 0);
    }

    #[tokio::test]
    async fn test_checkout_posts_and_clears_cart() {
        let h = harness(Some(cashier())).await;
        let galaxy = h.context.snapshot().product("2").cloned().unwrap();

        let mut cart = Cart::new();
        cart.add_item(&galaxy, 2).unwrap();
        let notice = h.mutations.checkout(&mut cart).await;
        assert!(notice.is_success(), "{}", notice);
        assert!(cart.is_empty());

        let snap = h.context.snapshot();
        assert_eq!(snap.transactions.len(), 2);
        let posted = snap.transactions.iter().find(|t| t.id != "100").unwrap();
        assert_eq!(posted.total.amount(), 27_998_000);
        assert_eq!(posted.cashier_name, "Kasir");
    }

    #[tokio::test]
    async fn test_failed_checkout_keeps_cart() {
        let h = harness(Some(cashier())).await;
        h.backend.fail_writes(Resource::Transactions, "Stok tidak cukup");
        let galaxy = h.context.snapshot().product("2").cloned().unwrap();

        let mut cart = Cart::new();
        cart.add_item(&galaxy, 1).unwrap();
        let notice = h.mutations.checkout(&mut cart).await;
        assert_eq!(notice.message, "Stok tidak cukup");
        assert_eq!(cart.item_count(), 1);

        let empty = h.mutations.checkout(&mut Cart::new()).await;
        assert_eq!(empty.message, "Cart is empty");
    }

    #[tokio::test]
    async fn test_settings_crud() {
        let h = harness(Some(admin_identity())).await;

        let notice = h
            .mutations
            .create_user(UserInput {
                name: "Kasir 2".into(),
                email: "kasir2@gadgetprima.com".into(),
                role: Role::Cashier,
                password: Some("rahasia123".into()),
            })
            .await;
        assert!(notice.is_success(), "{}", notice);
        assert_eq!(h.context.snapshot().users.len(), 3);

        assert!(h
            .mutations
            .create_brand(NamedInput { name: "Xiaomi".into() })
            .await
            .is_success());
        assert_eq!(h.context.snapshot().brands.len(), 3);

        assert!(h
            .mutations
            .update_category("1", NamedInput { name: "Ponsel".into() })
            .await
            .is_success());
        assert_eq!(h.context.snapshot().categories[0].name, "Ponsel");

        assert!(h.mutations.delete_brand("1").await.is_success());
        assert_eq!(h.context.snapshot().brands.len(), 2);

        let expense = ExpenseInput {
            date: NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
            description: "Internet".into(),
            amount: Money::new(450_000),
            category: "Utilities".into(),
        };
        assert!(h.mutations.record_expense(expense).await.is_success());
        assert_eq!(h.context.snapshot().expenses.len(), 2);

        let own = h.mutations.delete_user("1").await;
        assert_eq!(own.message, "You cannot delete your own account");
    }

    #[tokio::test]
    async fn test_signed_out_mutation_is_rejected() {
        let h = harness(None).await;
        assert!(h.session.identity().await.is_none());
        let notice = h.mutations.delete_expense("1").await;
        assert_eq!(notice.message, "Please sign in first.");
    }
}
