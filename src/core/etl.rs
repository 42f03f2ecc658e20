use crate::core::Pipeline;
use crate::utils::error::Result;
use std::time::Instant;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    pub async fn run(&self) -> Result<String> {
        let started = Instant::now();
        tracing::info!("Starting site generation...");

        // Extract
        tracing::info!("Extracting modifications...");
        let catalogue = self.pipeline.extract().await?;
        tracing::info!(
            "Extracted {} modifications ({} verified)",
            catalogue.modifications.len(),
            catalogue.modifications.iter().filter(|m| m.verified).count()
        );

        // Transform
        tracing::info!("Rendering pages...");
        let bundle = self.pipeline.transform(catalogue).await?;
        tracing::info!(
            "Rendered {} files ({} pages, {} images, {} without image)",
            bundle.files.len(),
            bundle.pages,
            bundle.images,
            bundle.missing_images.len()
        );

        // Load
        tracing::info!("Writing site...");
        let output_path = self.pipeline.load(bundle).await?;
        tracing::info!(
            "Site written to {} in {:.2?}",
            output_path,
            started.elapsed()
        );

        Ok(output_path)
    }
}
