use crate::domain::model::{CanonicalBase, Catalogue, SiteBundle};
use crate::domain::settings::TableNames;
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn database_path(&self) -> &str;
    /// Where the working copy of the database goes; `None` picks a path next
    /// to the original.
    fn database_copy_path(&self) -> Option<&str>;
    fn output_path(&self) -> &str;
    fn image_subdir(&self) -> &str;
    fn tables(&self) -> &TableNames;
    fn dnamod_version(&self) -> &str;
    fn chebi_version(&self) -> &str;
    fn shade_origins(&self) -> &[String];
    fn other_ratio(&self) -> usize;
    fn other_shared_base(&self) -> CanonicalBase;
}

/// Turns a SMILES string into an SVG depiction.
pub trait StructureRenderer: Send + Sync {
    fn render_svg(
        &self,
        smiles: &str,
    ) -> impl std::future::Future<Output = Result<Option<String>>> + Send;

    fn is_enabled(&self) -> bool {
        true
    }
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Catalogue>;
    async fn transform(&self, catalogue: Catalogue) -> Result<SiteBundle>;
    async fn load(&self, bundle: SiteBundle) -> Result<String>;
}
