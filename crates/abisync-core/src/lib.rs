pub mod abi;
pub mod error;
pub mod proxy;
pub mod registry;
pub mod types;

pub use abi::Abi;
pub use error::{Error, Result};
pub use proxy::{ProxyDetector, DEFAULT_MAX_PROXY_INIT_CODE_BYTES};
pub use registry::AbiRegistry;
pub use types::*;
