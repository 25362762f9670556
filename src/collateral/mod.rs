pub mod registry;
pub mod vault;

pub use registry::{CollateralAsset, CollateralRegistry};
pub use vault::{CollateralVault, Holdings};
