//! System-level modules
//!
//! - Logging initialization
//! - SDK reload coordination and the process-wide coordinator

pub mod logging;
pub mod reload;
