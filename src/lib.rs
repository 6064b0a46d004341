pub mod bmi;
pub mod error;
pub mod sync;
pub mod transform;
pub mod zcheck;

pub use bmi::{BmiDatumSync, DatumSyncConfig, Phase, VariableNames};
pub use error::DatumSyncError;
pub use sync::{Conversion, DatumSync};
pub use transform::{CrsTransform, GdalTransform};
pub use zcheck::ZWarning;
