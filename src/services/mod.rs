//! Business logic services.

pub mod analysis;
pub mod compliance;
pub mod credentials;
pub mod crypto;
pub mod extraction;
pub mod gateway;
pub mod intake;
pub mod key_resolver;
pub mod model_output;
pub mod quality;
pub mod reports;
pub mod storage;

pub use crypto::SecretBox;
pub use gateway::{HttpGateway, ModelGateway, Provider};
pub use storage::Storage;
