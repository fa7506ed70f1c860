//! # Gadget Prima Terminal Entry Point
//!
//! ## Startup Sequence
//! 1. Initialize tracing (logging)
//! 2. Load configuration (defaults → TOML → env)
//! 3. Restore the persisted session
//! 4. Optionally log in from `GADGET_EMAIL` / `GADGET_PASSWORD`
//! 5. Load the aggregate snapshot
//! 6. Print the dashboard for the signed-in role

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // The actual setup is in lib.rs for better testability
    gadget_terminal_lib::run().await
}
