//! Redirect Console - session control for remote KVM and virtual media
//!
//! This library drives redirection sessions to a managed device through a
//! web relay, including:
//! - Configuration management and relay endpoint construction
//! - The session lifecycle controller and its host interface
//! - Adapters around the external desktop and media engines
//! - Input capture with pointer throttling
//! - Media transfer statistics
//! - Logging infrastructure
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use redirect_console::config::{ConfigManager, RedirectionMode};
//! use redirect_console::engine::{EngineProvider, TransportFactory};
//! use redirect_console::logging;
//! use redirect_console::session::{SessionController, SessionHandle};
//!
//! # async fn run(
//! #     provider: Arc<dyn EngineProvider>,
//! #     transport: Arc<dyn TransportFactory>,
//! # ) -> redirect_console::Result<()> {
//! logging::init_default_logging();
//!
//! let config = ConfigManager::new()?.load_or_create_default()?;
//! let (controller, mut notifications) = SessionController::builder(
//!     config.transport(RedirectionMode::Desktop, "device-guid"),
//!     provider,
//!     transport,
//! )
//! .timing(config.session_timing())
//! .encoding(config.default_encoding()?)
//! .build();
//!
//! let (handle, task) = SessionHandle::spawn(controller);
//! handle.connection_trigger(true).await?;
//!
//! while let Some(notification) = notifications.recv().await {
//!     println!("{:?}", notification);
//! }
//! handle.shutdown().await;
//! let _ = task.await;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod engine;
pub mod error;
pub mod input;
pub mod logging;
pub mod session;

// Re-export commonly used types at crate root
pub use error::{RedirectError, Result};
