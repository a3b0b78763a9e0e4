//! taskconf-core: configuration layer of the taskconf to-do manager
//!
//! This crate loads raw key/value configuration (properties, YAML, JSON),
//! resolves `${NAME}` and `${NAME:default}` references against the
//! environment, and exposes the result as an immutable, typed
//! [`ResolvedConfig`].
//!
//! # Example
//!
//! ```rust
//! use taskconf_core::{FnLookup, RawConfig};
//!
//! let raw = RawConfig::from_properties(
//!     "db.url=${DB_URL:jdbc:h2:mem:todo}\n\
//!      db.opts=${DB_OPTS:mode\\\\:legacy}\n\
//!      db.user=${DB_USER:sa}\n",
//! )?;
//! let env = FnLookup::new(|name: &str| (name == "DB_USER").then(|| "todo".to_string()));
//! let config = raw.resolve(&env);
//!
//! assert_eq!(config.get("db.url"), Some("jdbc:h2:mem:todo"));
//! assert_eq!(config.get("db.opts"), Some("mode:legacy"));
//! assert_eq!(config.get_string("db.user")?, "todo");
//! # Ok::<(), taskconf_core::Error>(())
//! ```

pub mod error;
pub mod interpolation;
pub mod lookup;
pub mod source;

mod config;
mod resolved;

pub use config::{FileSpec, RawConfig};
pub use error::{Error, ErrorKind, Result};
pub use interpolation::{resolve, Interpolator, Placeholder};
pub use lookup::{EnvLookup, FnLookup, Layered, ProcessEnv};
pub use resolved::ResolvedConfig;
pub use source::Format;
