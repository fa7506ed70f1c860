//! # gadget-client: I/O Layer for Gadget Prima POS
//!
//! Session persistence, the REST gateway, payload normalization, the
//! aggregate data context and the application shell.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           gadget-client                                 │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                   PosApp (app.rs)                                │  │
//! │  │  auth state machine, role-gated navigation, lifecycle            │  │
//! │  └──────────┬────────────────────┬──────────────────────┬───────────┘  │
//! │             ▼                    ▼                      ▼              │
//! │  ┌────────────────┐  ┌──────────────────────┐  ┌──────────────────┐   │
//! │  │ SessionStore   │  │ DataContext          │  │ Mutations        │   │
//! │  │                │  │                      │  │                  │   │
//! │  │ token+identity │  │ six-way fan-out,     │  │ CRUD + checkout, │   │
//! │  │ one source of  │  │ per-branch results,  │  │ refresh on       │   │
//! │  │ truth          │  │ stale-cycle guard    │  │ success          │   │
//! │  └───────┬────────┘  └──────────┬───────────┘  └────────┬─────────┘   │
//! │          │                      ▼                       │             │
//! │          │           ┌──────────────────────┐           │             │
//! │          └──────────►│ Backend (gateway.rs) │◄──────────┘             │
//! │                      │ HttpGateway: reqwest │                         │
//! │                      └──────────┬───────────┘                         │
//! │                                 ▼                                      │
//! │                      ┌──────────────────────┐                         │
//! │                      │ normalize.rs         │                         │
//! │                      │ raw JSON → model     │                         │
//! │                      └──────────────────────┘                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`app`] - `PosApp` shell
//! - [`aggregate`] - `DataContext` and its snapshot channel
//! - [`config`] - TOML + env configuration
//! - [`error`] - `ClientError`
//! - [`gateway`] - `Backend` trait and `HttpGateway`
//! - [`mutations`] - Writes from the view modules
//! - [`normalize`] - Tolerant decoding of backend rows
//! - [`notice`] - Success/error notifications
//! - [`session`] - `SessionStore`
//! - [`storage`] - Durable key/value storage for the session

pub mod aggregate;
pub mod app;
pub mod config;
pub mod error;
pub mod gateway;
pub mod mutations;
pub mod normalize;
pub mod notice;
pub mod session;
pub mod storage;

#[cfg(test)]
mod testing;

pub use aggregate::{ContextState, DataContext, LoadOutcome};
pub use app::PosApp;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use gateway::{Backend, HttpGateway, Resource};
pub use mutations::Mutations;
pub use notice::{Notice, NoticeLevel};
pub use session::{SessionHandle, SessionStore};
pub use storage::{FileStorage, MemoryStorage, SessionStorage};
