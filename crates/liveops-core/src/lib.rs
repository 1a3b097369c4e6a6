pub mod config_manager;
pub mod dump_source;
pub mod error;
pub mod traits;
pub mod types;

pub use config_manager::*;
pub use dump_source::*;
pub use error::*;
pub use traits::*;
pub use types::*;
