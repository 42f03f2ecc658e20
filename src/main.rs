use clap::Parser;
use dnamod_site::core::{ConfigProvider, StructureRenderer};
use dnamod_site::utils::{logger, validation::Validate};
use dnamod_site::{
    CliConfig, DisabledRenderer, EtlEngine, LocalStorage, OpenBabelRenderer, SitePipeline,
};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting dnamod-site");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(e.exit_code().max(1));
    }

    // 渲染器型別不同，各自建立管道
    let result = if config.no_images {
        generate(config, DisabledRenderer).await
    } else {
        let renderer = OpenBabelRenderer::new(
            config.obabel.clone(),
            Duration::from_secs(config.render_timeout_seconds),
        );
        generate(config, renderer).await
    };

    match result {
        Ok(output_path) => {
            tracing::info!("✅ Site generated successfully!");
            println!("✅ Site generated successfully!");
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => {
            // 記錄詳細錯誤信息
            tracing::error!(
                "❌ Site generation failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            let exit_code = e.exit_code();
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

async fn generate<R: StructureRenderer>(
    config: CliConfig,
    renderer: R,
) -> dnamod_site::Result<String> {
    let storage = LocalStorage::new(config.output_path().to_string());
    let pipeline = SitePipeline::new(storage, config, renderer);
    EtlEngine::new(pipeline).run().await
}
