//! burger-shop: chefs make a bounded number of burgers, customers connected
//! over TCP claim them, and every burger goes to exactly one customer.

pub mod allocation;
pub mod bridge;
pub mod client;
pub mod config;
pub mod kitchen;
pub mod pacing;
pub mod session;
pub mod supervisor;
pub mod telemetry;
pub mod transport;

pub use allocation::{ClaimOutcome, Ledger, LedgerSnapshot, ProduceOutcome, RunState, Unit};
pub use client::{ClientConfig, ClientEnd, ClientError, ClientReport, order_loop, run_client};
pub use config::{ConfigError, ShopConfig};
pub use kitchen::{ChefReport, Kitchen, KitchenHandle};
pub use pacing::{Pacing, PacingError};
pub use session::{ConsumerSession, SessionConfig, SessionEnd, SessionError, SessionReport};
pub use supervisor::{SessionInfo, SessionSupervisor, SupervisorReport};
pub use transport::{ServeReport, ServerConfig, serve, serve_listener};
