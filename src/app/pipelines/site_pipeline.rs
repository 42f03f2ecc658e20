use crate::adapters::SqliteSource;
use crate::app::pages::{HomePage, HomepageOptions, ModificationPage, SiteContext};
use crate::core::hierarchy::{build_verified_hierarchy, OntologyMember};
use crate::core::nomenclature::{page_stem, strip_sql_quotes};
use crate::core::{ConfigProvider, Pipeline, Storage, StructureRenderer};
use crate::domain::model::{Catalogue, ModificationRecord, Nucleobase, SiteBundle};
use crate::domain::settings::DatabaseSettings;
use crate::utils::error::{Result, SiteError};
use askama::Template;
use serde::Serialize;
use std::collections::HashSet;

/// Machine-readable index of the generated pages, written as `manifest.json`.
#[derive(Debug, Serialize)]
pub struct SiteManifest {
    pub dnamod_version: String,
    pub chebi_version: String,
    pub updated: String,
    pub modifications: Vec<ManifestEntry>,
}

#[derive(Debug, Serialize)]
pub struct ManifestEntry {
    pub chebi_id: String,
    pub chebi_name: String,
    pub base: Nucleobase,
    pub verified: bool,
    pub page: String,
    pub image: Option<String>,
}

/// 讀取修飾資料庫並產生整個靜態網站
pub struct SitePipeline<S: Storage, C: ConfigProvider, R: StructureRenderer> {
    storage: S,
    config: C,
    renderer: R,
}

impl<S: Storage, C: ConfigProvider, R: StructureRenderer> SitePipeline<S, C, R> {
    pub fn new(storage: S, config: C, renderer: R) -> Self {
        Self {
            storage,
            config,
            renderer,
        }
    }

    fn image_path(&self, stem: &str) -> String {
        let subdir = self.config.image_subdir().trim_matches('/');
        if subdir.is_empty() {
            format!("{}.svg", stem)
        } else {
            format!("{}/{}.svg", subdir, stem)
        }
    }

    /// 結構圖失敗不影響頁面輸出，只記錄警告
    async fn render_structure(
        &self,
        record: &ModificationRecord,
        stem: &str,
        bundle: &mut SiteBundle,
    ) -> Option<String> {
        let smiles = strip_sql_quotes(&record.smiles);
        if smiles.is_empty() || !self.renderer.is_enabled() {
            return None;
        }

        match self.renderer.render_svg(smiles).await {
            Ok(Some(svg)) => {
                let path = self.image_path(stem);
                bundle.push(path.clone(), svg);
                bundle.images += 1;
                Some(path)
            }
            Ok(None) => {
                tracing::warn!("⚠️ No structure image produced for {}", record.chebi_name);
                bundle.missing_images.push(record.chebi_name.clone());
                None
            }
            Err(e) => {
                tracing::warn!("⚠️ failed to render image for {}: {}", record.chebi_name, e);
                bundle.missing_images.push(record.chebi_name.clone());
                None
            }
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider, R: StructureRenderer> Pipeline for SitePipeline<S, C, R> {
    async fn extract(&self) -> Result<Catalogue> {
        let settings = DatabaseSettings::from_provider(&self.config);
        tracing::info!("🚀 Reading modifications from {}", settings.path.display());

        // rusqlite 連線不是 Sync，整段讀取放在 blocking 執行緒
        tokio::task::spawn_blocking(move || SqliteSource::open(&settings)?.load_catalogue())
            .await
            .map_err(|e| SiteError::ProcessingError {
                message: format!("database task failed: {}", e),
            })?
    }

    async fn transform(&self, catalogue: Catalogue) -> Result<SiteBundle> {
        let context = SiteContext {
            updated: catalogue.database_modified.format("%Y-%m-%d").to_string(),
            dnamod_version: self.config.dnamod_version().to_string(),
            chebi_version: self.config.chebi_version().to_string(),
        };
        let mut bundle = SiteBundle::default();
        let mut stems = HashSet::new();
        // 首頁只列出實際產生頁面的修飾
        let mut published: Vec<ModificationRecord> =
            Vec::with_capacity(catalogue.modifications.len());
        let mut manifest = SiteManifest {
            dnamod_version: context.dnamod_version.clone(),
            chebi_version: context.chebi_version.clone(),
            updated: context.updated.clone(),
            modifications: Vec::with_capacity(catalogue.modifications.len()),
        };

        if !self.renderer.is_enabled() {
            tracing::info!("🖼️ Structure rendering disabled");
        }

        for record in &catalogue.modifications {
            let stem = page_stem(&record.chebi_name);
            if !stems.insert(stem.clone()) {
                tracing::warn!(
                    "⚠️ Skipping {} ({}): page {}.html already generated",
                    record.chebi_name,
                    record.chebi_id,
                    stem
                );
                continue;
            }

            let image = self.render_structure(record, &stem, &mut bundle).await;
            let page_path = format!("{}.html", stem);
            manifest.modifications.push(ManifestEntry {
                chebi_id: record.chebi_id.clone(),
                chebi_name: record.chebi_name.clone(),
                base: record.base,
                verified: record.verified,
                page: page_path.clone(),
                image: image.clone(),
            });

            let page = ModificationPage::from_record(record, image, &context);
            bundle.push(page_path, page.render()?);
            bundle.pages += 1;
            published.push(record.clone());
            tracing::debug!("Rendered page for {}", record.chebi_name);
        }

        let members: Vec<OntologyMember> = published
            .iter()
            .map(|r| OntologyMember::new(r.chebi_id.clone(), r.base, r.verified))
            .collect();
        let hierarchy = build_verified_hierarchy(
            &members,
            &catalogue.links,
            self.config.other_shared_base(),
        );
        for id in hierarchy.unplaced() {
            tracing::warn!("⚠️ Verified modification {} is only reachable through a cycle", id);
        }
        if hierarchy.is_empty() {
            tracing::warn!("⚠️ No verified modifications, the homepage hierarchy will be empty");
        }

        let options = HomepageOptions {
            shade_origins: self.config.shade_origins(),
            other_ratio: self.config.other_ratio(),
            other_shared_base: self.config.other_shared_base(),
        };
        let homepage = HomePage::build(
            &published,
            &catalogue.nomenclature,
            &hierarchy,
            &options,
            &context,
        );
        bundle.push("index.html", homepage.render()?);
        bundle.push("manifest.json", serde_json::to_vec_pretty(&manifest)?);

        tracing::info!(
            "🔄 Rendered {} pages and {} structure images",
            bundle.pages,
            bundle.images
        );
        Ok(bundle)
    }

    async fn load(&self, bundle: SiteBundle) -> Result<String> {
        tracing::debug!("Writing {} files to storage", bundle.files.len());
        for file in &bundle.files {
            self.storage.write_file(&file.path, &file.contents).await?;
        }

        if !bundle.missing_images.is_empty() {
            tracing::warn!(
                "⚠️ {} modifications have no structure image: {}",
                bundle.missing_images.len(),
                bundle.missing_images.join(", ")
            );
        }

        Ok(self.config.output_path().to_string())
    }
}
