pub mod etl;
pub mod hierarchy;
pub mod nomenclature;

pub use crate::domain::model::{Catalogue, SiteBundle};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage, StructureRenderer};
pub use crate::utils::error::Result;
