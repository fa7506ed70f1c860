//! In-memory [`Backend`] for tests.
//!
//! Stores raw JSON rows per resource, so the real normalization runs on
//! everything it returns. Supports failure injection per resource and
//! holding a single `list` or `login` call until the test releases it.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use gadget_core::Identity;
use serde_json::{json, Value};
use tokio::sync::Notify;

use crate::error::{ClientError, ClientResult};
use crate::gateway::{Backend, Resource};
use crate::normalize;

/// Pauses one `list` call: `entered` fires when the call arrives, the call
/// continues after `release`.
#[derive(Default)]
pub struct Gate {
    pub entered: Notify,
    pub release: Notify,
}

#[derive(Default)]
pub struct FakeBackend {
    rows: Mutex<HashMap<Resource, Vec<Value>>>,
    failing_lists: Mutex<HashSet<Resource>>,
    failing_writes: Mutex<HashMap<Resource, String>>,
    gates: Mutex<HashMap<Resource, Arc<Gate>>>,
    login_gate: Mutex<Option<Arc<Gate>>>,
    accounts: Vec<(String, String, Value)>,
    next_id: AtomicU64,
    list_calls: AtomicUsize,
    write_calls: AtomicUsize,
}

pub fn admin_identity() -> Identity {
    Identity {
        id: "1".into(),
        name: "Admin Toko".into(),
        email: "admin@gadgetprima.com".into(),
        role: "Admin".into(),
        token: "token-1".into(),
    }
}

impl FakeBackend {
    /// A small store: two products, one sale, one expense, two staff.
    pub fn seeded() -> Self {
        let mut rows = HashMap::new();
        rows.insert(
            Resource::Products,
            vec![
                json!({ "id": 1, "name": "iPhone 15", "sku": "IPH-15", "category": "Smartphone",
                        "brand": "Apple", "price": 19500000, "buy_price": 18525000, "stock": 4, "min_stock": 5 }),
                json!({ "id": 2, "name": "Galaxy S24", "sku": "SAM-S24", "category": "Smartphone",
                        "brand": "Samsung", "price": 13999000, "purchasePrice": 12500000, "stock": 10, "minStock": 2 }),
            ],
        );
        rows.insert(
            Resource::Transactions,
            vec![json!({
                "id": 100, "date": "2024-03-02T10:00:00Z", "cashierId": 2, "cashierName": "Kasir",
                "paymentMethod": "cash",
                "items": [{ "productId": 2, "productName": "Galaxy S24", "quantity": 1, "price": 13999000 }]
            })],
        );
        rows.insert(
            Resource::Expenses,
            vec![json!({ "id": 1, "date": "2024-03-01", "description": "Listrik", "amount": 750000, "category": "Utilities" })],
        );
        rows.insert(
            Resource::Users,
            vec![
                json!({ "id": 1, "name": "Admin Toko", "email": "admin@gadgetprima.com", "role": "Admin" }),
                json!({ "id": 2, "name": "Kasir", "email": "kasir@gadgetprima.com", "role": "cashier" }),
            ],
        );
        rows.insert(Resource::Categories, vec![json!({ "id": 1, "name": "Smartphone" })]);
        rows.insert(
            Resource::Brands,
            vec![json!({ "id": 1, "name": "Apple" }), json!({ "id": 2, "name": "Samsung" })],
        );

        let account = |id: u64, name: &str, email: &str, password: &str, role: &str| {
            (
                email.to_string(),
                password.to_string(),
                json!({ "id": id, "name": name, "email": email, "role": role }),
            )
        };

        FakeBackend {
            rows: Mutex::new(rows),
            accounts: vec![
                account(1, "Admin Toko", "admin@gadgetprima.com", "admin123", "Admin"),
                account(2, "Kasir", "kasir@gadgetprima.com", "kasir123", "cashier"),
                account(3, "Gudang", "gudang@gadgetprima.com", "gudang123", "WAREHOUSE"),
                account(4, "Pemilik", "owner@gadgetprima.com", "owner123", "owner"),
                account(5, "Magang", "intern@gadgetprima.com", "intern123", "intern"),
            ],
            next_id: AtomicU64::new(1000),
            ..FakeBackend::default()
        }
    }

    pub fn fail_list(&self, resource: Resource) {
        self.failing_lists.lock().unwrap().insert(resource);
    }

    /// Makes create/update/delete on `resource` fail with `message`.
    pub fn fail_writes(&self, resource: Resource, message: &str) {
        self.failing_writes
            .lock()
            .unwrap()
            .insert(resource, message.to_string());
    }

    pub fn hold_next_list(&self, resource: Resource) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        self.gates.lock().unwrap().insert(resource, gate.clone());
        gate
    }

    /// Pauses the next `login` call the same way.
    pub fn hold_next_login(&self) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        *self.login_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn replace_rows(&self, resource: Resource, rows: Vec<Value>) {
        self.rows.lock().unwrap().insert(resource, rows);
    }

    pub fn push_row(&self, resource: Resource, row: Value) {
        self.rows.lock().unwrap().entry(resource).or_default().push(row);
    }

    pub fn rows(&self, resource: Resource) -> Vec<Value> {
        self.rows
            .lock()
            .unwrap()
            .get(&resource)
            .cloned()
            .unwrap_or_default()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn write_calls(&self) -> usize {
        self.write_calls.load(Ordering::SeqCst)
    }

    fn check_write(&self, resource: Resource) -> ClientResult<()> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        match self.failing_writes.lock().unwrap().get(&resource) {
            Some(message) => Err(ClientError::Api {
                status: 422,
                message: Some(message.clone()),
            }),
            None => Ok(()),
        }
    }
}

fn row_id(row: &Value) -> String {
    match &row["id"] {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn login(&self, email: &str, password: &str) -> ClientResult<Identity> {
        let gate = self.login_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }

        let (_, _, user) = self
            .accounts
            .iter()
            .find(|(e, p, _)| e == email && p == password)
            .ok_or_else(|| ClientError::Unauthorized {
                message: Some("Email atau password salah".into()),
            })?;
        let user = normalize::user(user)?;
        let token = format!("token-{}", user.id);
        Ok(Identity::from_user(user, token))
    }

    async fn list(&self, resource: Resource) -> ClientResult<Value> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let rows = self.rows(resource);

        let gate = self.gates.lock().unwrap().remove(&resource);
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }

        if self.failing_lists.lock().unwrap().contains(&resource) {
            return Err(ClientError::Api {
                status: 500,
                message: Some(format!("{} unavailable", resource)),
            });
        }
        Ok(Value::Array(rows))
    }

    async fn create(&self, resource: Resource, mut body: Value) -> ClientResult<Value> {
        self.check_write(resource)?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        body["id"] = json!(id);
        if resource == Resource::Users {
            if let Some(obj) = body.as_object_mut() {
                obj.remove("password");
            }
        }
        self.push_row(resource, body.clone());
        Ok(body)
    }

    async fn update(&self, resource: Resource, id: &str, body: Value) -> ClientResult<Value> {
        self.check_write(resource)?;
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .entry(resource)
            .or_default()
            .iter_mut()
            .find(|r| row_id(r) == id)
            .ok_or(ClientError::Api {
                status: 404,
                message: Some("Not found".into()),
            })?;
        if let (Some(target), Some(changes)) = (row.as_object_mut(), body.as_object()) {
            for (k, v) in changes {
                if k != "password" {
                    target.insert(k.clone(), v.clone());
                }
            }
        }
        Ok(row.clone())
    }

    async fn delete(&self, resource: Resource, id: &str) -> ClientResult<()> {
        self.check_write(resource)?;
        let mut rows = self.rows.lock().unwrap();
        let list = rows.entry(resource).or_default();
        let before = list.len();
        list.retain(|r| row_id(r) != id);
        if list.len() == before {
            return Err(ClientError::Api {
                status: 404,
                message: Some("Not found".into()),
            });
        }
        Ok(())
    }
}
