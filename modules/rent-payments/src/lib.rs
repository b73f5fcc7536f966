pub mod config;
pub mod confirmation;
pub mod db;
pub mod directory;
pub mod error;
pub mod intents;
pub mod ledger;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod money;
pub mod processor;
pub mod reconciler;
pub mod routes;
pub mod state;
pub mod telemetry;

pub use error::PaymentError;
pub use models::ErrorResponse;
pub use ledger::{LedgerWrite, PaymentLedger, PaymentStatus};
pub use processor::PaymentProcessor;
pub use routes::payments_router;
pub use state::{AppState, PaymentSettings};
