//! # Role-Gated Navigation
//!
//! Decides which application sections an identity may see, and tracks which
//! one is on screen.
//!
//! ## Capability Table
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Section        admin   cashier   warehouse   owner                     │
//! │  ─────────────  ─────   ───────   ─────────   ─────                     │
//! │  dashboard        ✔        ✔          ✔         ✔                       │
//! │  products         ✔                   ✔                                 │
//! │  transactions     ✔        ✔                                            │
//! │  reports          ✔                               ✔                     │
//! │  settings         ✔                                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The table is plain data ([`MENU`]); filtering is a pure function over it.
//! Menu order is declaration order.
//!
//! ## Auth State Machine
//! ```text
//!                      submit credentials
//!   ┌────────────────┐ ─────────────────► ┌────────────────┐
//!   │ Unauthenticated│                    │ Authenticating │
//!   │  (error?)      │ ◄───────────────── │                │
//!   └────────────────┘    login failed    └───────┬────────┘
//!           ▲                                     │ login ok
//!           │ logout                              ▼
//!           │                      ┌──────────────────────────────┐
//!           └───────────────────── │ Authenticated(section = S)   │──┐
//!                                  └──────────────────────────────┘  │
//!                                        ▲   set_active_section(S')  │
//!                                        └── only if S' is visible ──┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::types::{Identity, Role};

// =============================================================================
// Sections
// =============================================================================

/// A navigable area of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Section {
    Dashboard,
    Products,
    Transactions,
    Reports,
    Settings,
}

/// The section shown right after login and after logout.
pub const DEFAULT_SECTION: Section = Section::Dashboard;

impl Section {
    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Dashboard => "dashboard",
            Section::Products => "products",
            Section::Transactions => "transactions",
            Section::Reports => "reports",
            Section::Settings => "settings",
        }
    }

    /// The menu entry describing this section.
    pub fn menu_item(&self) -> &'static MenuItem {
        // Every section has exactly one entry in MENU.
        match self {
            Section::Dashboard => &MENU[0],
            Section::Products => &MENU[1],
            Section::Transactions => &MENU[2],
            Section::Reports => &MENU[3],
            Section::Settings => &MENU[4],
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Section {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dashboard" => Ok(Section::Dashboard),
            "products" => Ok(Section::Products),
            "transactions" => Ok(Section::Transactions),
            "reports" => Ok(Section::Reports),
            "settings" => Ok(Section::Settings),
            other => Err(format!("unknown section '{}'", other)),
        }
    }
}

// =============================================================================
// Menu Table
// =============================================================================

/// Static descriptor of a menu entry. Defined at build time, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: Section,
    pub label: &'static str,
    /// Icon name understood by the web front end's icon set.
    pub icon: &'static str,
    pub allowed_roles: &'static [Role],
}

impl MenuItem {
    pub fn allows(&self, role: Role) -> bool {
        self.allowed_roles.contains(&role)
    }
}

/// The capability table, in menu order.
pub static MENU: [MenuItem; 5] = [
    MenuItem {
        id: Section::Dashboard,
        label: "Dashboard",
        icon: "LayoutDashboard",
        allowed_roles: &[Role::Admin, Role::Cashier, Role::Warehouse, Role::Owner],
    },
    MenuItem {
        id: Section::Products,
        label: "Products",
        icon: "Package",
        allowed_roles: &[Role::Admin, Role::Warehouse],
    },
    MenuItem {
        id: Section::Transactions,
        label: "Transactions",
        icon: "ShoppingCart",
        allowed_roles: &[Role::Admin, Role::Cashier],
    },
    MenuItem {
        id: Section::Reports,
        label: "Reports",
        icon: "BarChart3",
        allowed_roles: &[Role::Admin, Role::Owner],
    },
    MenuItem {
        id: Section::Settings,
        label: "Settings",
        icon: "Settings",
        allowed_roles: &[Role::Admin],
    },
];

// =============================================================================
// Filtering
// =============================================================================

/// Sections visible to `role`, in menu order. No role → no sections.
pub fn visible_sections(role: Option<Role>) -> Vec<Section> {
    match role {
        Some(role) => MENU
            .iter()
            .filter(|item| item.allows(role))
            .map(|item| item.id)
            .collect(),
        None => Vec::new(),
    }
}

/// Same as [`visible_sections`] for a role string as stored upstream.
///
/// ## Example
/// ```rust
/// use gadget_core::navigation::{visible_sections_for, Section};
///
/// assert_eq!(
///     visible_sections_for("CASHIER"),
///     vec![Section::Dashboard, Section::Transactions]
/// );
/// assert!(visible_sections_for("intern").is_empty());
/// ```
pub fn visible_sections_for(raw_role: &str) -> Vec<Section> {
    visible_sections(Role::parse_lenient(raw_role))
}

/// Menu entries visible to `role`, in menu order.
pub fn visible_menu(role: Option<Role>) -> Vec<&'static MenuItem> {
    visible_sections(role)
        .into_iter()
        .map(|s| s.menu_item())
        .collect()
}

/// True when `role` may view `section`.
pub fn can_view(role: Option<Role>, section: Section) -> bool {
    role.is_some_and(|r| section.menu_item().allows(r))
}

// =============================================================================
// Auth State
// =============================================================================

/// Where the session is in the login flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    /// Nobody is logged in. `error` holds the last login failure, if any.
    Unauthenticated { error: Option<String> },
    /// Credentials were submitted and the login call is in flight.
    Authenticating,
    /// Logged in, showing `section`.
    Authenticated { identity: Identity, section: Section },
}

impl Default for AuthState {
    fn default() -> Self {
        AuthState::Unauthenticated { error: None }
    }
}

// =============================================================================
// Navigator
// =============================================================================

/// Ticket for one credential submission. Results are only accepted for the
/// attempt that is still in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginAttempt(u64);

/// Holds the auth state and enforces the section guard.
#[derive(Debug, Clone, Default)]
pub struct Navigator {
    state: AuthState,
    attempts: u64,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    pub fn identity(&self) -> Option<&Identity> {
        match &self.state {
            AuthState::Authenticated { identity, .. } => Some(identity),
            _ => None,
        }
    }

    pub fn role(&self) -> Option<Role> {
        self.identity().and_then(Identity::role)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, AuthState::Authenticated { .. })
    }

    /// The section on screen. [`DEFAULT_SECTION`] outside an authenticated session.
    pub fn active_section(&self) -> Section {
        match &self.state {
            AuthState::Authenticated { section, .. } => *section,
            _ => DEFAULT_SECTION,
        }
    }

    /// Last login error, when unauthenticated after a failure.
    pub fn login_error(&self) -> Option<&str> {
        match &self.state {
            AuthState::Unauthenticated { error } => error.as_deref(),
            _ => None,
        }
    }

    pub fn visible_sections(&self) -> Vec<Section> {
        visible_sections(self.role())
    }

    /// unauthenticated → authenticating. `None` from any other state.
    pub fn begin_login(&mut self) -> Option<LoginAttempt> {
        if !matches!(self.state, AuthState::Unauthenticated { .. }) {
            return None;
        }
        self.attempts += 1;
        self.state = AuthState::Authenticating;
        Some(LoginAttempt(self.attempts))
    }

    /// Whether `attempt` is the login currently in flight. False once a
    /// logout or a newer attempt has superseded it.
    pub fn is_current(&self, attempt: LoginAttempt) -> bool {
        self.state == AuthState::Authenticating && attempt.0 == self.attempts
    }

    /// authenticating → authenticated(dashboard). Returns false (and changes
    /// nothing) unless `attempt` is still the one in flight.
    pub fn login_succeeded(&mut self, attempt: LoginAttempt, identity: Identity) -> bool {
        if !self.is_current(attempt) {
            return false;
        }
        self.state = AuthState::Authenticated {
            identity,
            section: DEFAULT_SECTION,
        };
        true
    }

    /// authenticating → unauthenticated(error).
    pub fn login_failed(&mut self, attempt: LoginAttempt, error: impl Into<String>) -> bool {
        if !self.is_current(attempt) {
            return false;
        }
        self.state = AuthState::Unauthenticated {
            error: Some(error.into()),
        };
        true
    }

    /// Enters authenticated(dashboard) for a session restored from storage.
    pub fn restore(&mut self, identity: Identity) {
        self.state = AuthState::Authenticated {
            identity,
            section: DEFAULT_SECTION,
        };
    }

    /// Switches to `target` if the current identity may view it.
    ///
    /// Returns whether the switch happened. Anything else (not logged in,
    /// section not visible to the role) leaves the active section unchanged.
    pub fn set_active_section(&mut self, target: Section) -> bool {
        let AuthState::Authenticated { identity, section } = &mut self.state else {
            return false;
        };
        if !can_view(identity.role(), target) {
            return false;
        }
        *section = target;
        true
    }

    /// authenticated(*) → unauthenticated. The active section falls back to
    /// the default.
    pub fn logout(&mut self) {
        self.state = AuthState::default();
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(role: &str) -> Identity {
        Identity {
            id: "1".into(),
            name: "Test".into(),
            email: "test@gadgetprima.com".into(),
            role: role.into(),
            token: "tok".into(),
        }
    }

    fn logged_in(role: &str) -> Navigator {
        let mut nav = Navigator::new();
        let attempt = nav.begin_login().unwrap();
        assert!(nav.login_succeeded(attempt, identity(role)));
        nav
    }

    #[test]
    fn test_visible_sections_per_role() {
        use Section::*;
        assert_eq!(
            visible_sections(Some(Role::Admin)),
            vec![Dashboard, Products, Transactions, Reports, Settings]
        );
        assert_eq!(visible_sections(Some(Role::Cashier)), vec![Dashboard, Transactions]);
        assert_eq!(visible_sections(Some(Role::Warehouse)), vec![Dashboard, Products]);
        assert_eq!(visible_sections(Some(Role::Owner)), vec![Dashboard, Reports]);
        assert!(visible_sections(None).is_empty());
    }

    #[test]
    fn test_visible_sections_ignores_casing() {
        for raw in ["admin", "Admin", "ADMIN", " aDmIn "] {
            assert_eq!(visible_sections_for(raw).len(), 5, "role {raw:?}");
        }
        assert_eq!(visible_sections_for("Owner"), visible_sections(Some(Role::Owner)));
        assert!(visible_sections_for("").is_empty());
        assert!(visible_sections_for("supervisor").is_empty());
    }

    #[test]
    fn test_menu_matches_sections() {
        for item in MENU.iter() {
            assert_eq!(item.id.menu_item().id, item.id);
        }
        let labels: Vec<_> = visible_menu(Some(Role::Owner)).iter().map(|m| m.label).collect();
        assert_eq!(labels, vec!["Dashboard", "Reports"]);
    }

    #[test]
    fn test_login_flow_lands_on_dashboard() {
        let nav = logged_in("admin");
        assert!(nav.is_authenticated());
        assert_eq!(nav.active_section(), Section::Dashboard);
    }

    #[test]
    fn test_cashier_cannot_open_settings() {
        let mut nav = logged_in("cashier");
        assert_eq!(
            nav.visible_sections(),
            vec![Section::Dashboard, Section::Transactions]
        );

        assert!(!nav.set_active_section(Section::Settings));
        assert_eq!(nav.active_section(), Section::Dashboard);

        assert!(nav.set_active_section(Section::Transactions));
        assert_eq!(nav.active_section(), Section::Transactions);

        assert!(!nav.set_active_section(Section::Reports));
        assert_eq!(nav.active_section(), Section::Transactions);
    }

    #[test]
    fn test_guard_never_leaves_visible_set() {
        for role in ["admin", "cashier", "warehouse", "owner", "CASHIER", "ghost"] {
            let mut nav = logged_in(role);
            for target in MENU.iter().map(|m| m.id) {
                nav.set_active_section(target);
                let active = nav.active_section();
                assert!(
                    active == DEFAULT_SECTION || nav.visible_sections().contains(&active),
                    "{role} ended up on {active}"
                );
            }
        }
    }

    #[test]
    fn test_unauthenticated_cannot_navigate() {
        let mut nav = Navigator::new();
        assert!(!nav.set_active_section(Section::Dashboard));
        assert!(nav.visible_sections().is_empty());
    }

    #[test]
    fn test_login_failure_reports_error() {
        let mut nav = Navigator::new();
        let attempt = nav.begin_login().unwrap();
        assert!(nav.begin_login().is_none(), "double submit is ignored");
        assert!(nav.login_failed(attempt, "Invalid credentials"));
        assert_eq!(nav.login_error(), Some("Invalid credentials"));
        assert!(!nav.is_authenticated());

        // A new attempt clears the error.
        assert!(nav.begin_login().is_some());
        assert_eq!(nav.login_error(), None);
    }

    #[test]
    fn test_logout_resets_section() {
        let mut nav = Navigator::new();
        let attempt = nav.begin_login().unwrap();
        assert!(nav.login_succeeded(attempt, identity("admin")));
        nav.set_active_section(Section::Reports);
        nav.logout();
        assert_eq!(nav.state(), &AuthState::Unauthenticated { error: None });
        assert_eq!(nav.active_section(), Section::Dashboard);

        // A login result arriving after logout is ignored.
        assert!(!nav.login_succeeded(attempt, identity("admin")));
        assert!(!nav.is_authenticated());
    }

    #[test]
    fn test_superseded_attempt_cannot_land_on_newer_one() {
        let mut nav = Navigator::new();
        let first = nav.begin_login().unwrap();
        nav.logout();
        let second = nav.begin_login().unwrap();

        assert!(!nav.is_current(first));
        assert!(!nav.login_succeeded(first, identity("admin")));
        assert!(!nav.login_failed(first, "late failure"));
        assert_eq!(nav.state(), &AuthState::Authenticating);

        assert!(nav.login_succeeded(second, identity("cashier")));
        assert_eq!(nav.role(), Some(Role::Cashier));
    }
}
