use clap::Parser;
use dnamod_site::core::{ConfigProvider, StructureRenderer};
use dnamod_site::domain::model::Nucleobase;
use dnamod_site::domain::settings::DatabaseSettings;
use dnamod_site::utils::{logger, validation::Validate};
use dnamod_site::{
    DisabledRenderer, EtlEngine, LocalStorage, OpenBabelRenderer, SiteConfig, SitePipeline,
    SqliteSource,
};

#[derive(Parser)]
#[command(name = "toml-site")]
#[command(about = "Generate the DNAmod website from a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "dnamod-site.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    /// Override the images section and skip structure rendering
    #[arg(long)]
    no_images: bool,

    /// Dry run - load the catalogue and report what would be generated
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // 初始化日誌
    if args.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting TOML-based site generator");
    tracing::info!("📁 Loading configuration from: {}", args.config);

    // 載入 TOML 配置
    let mut config = match SiteConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 應用命令列覆蓋設定
    if args.no_images {
        config.images.enabled = false;
        tracing::info!("🔧 Structure images disabled from the command line");
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(e.exit_code().max(1));
    }

    tracing::info!("✅ Configuration loaded and validated successfully");

    // 顯示配置摘要
    display_config_summary(&config, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - nothing will be written");
        if let Err(e) = perform_dry_run(&config).await {
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(e.exit_code().max(1));
        }
        return Ok(());
    }

    let result = if config.images_enabled() {
        let renderer =
            OpenBabelRenderer::new(config.images.obabel_path.clone(), config.render_timeout());
        generate(config, renderer).await
    } else {
        generate(config, DisabledRenderer).await
    };

    match result {
        Ok(output_path) => {
            tracing::info!("✅ Site generated successfully!");
            println!("✅ Site generated successfully!");
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => {
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
    config: SiteConfig,
    renderer: R,
) -> dnamod_site::Result<String> {
    let storage = LocalStorage::new(config.output_path().to_string());
    let pipeline = SitePipeline::new(storage, config, renderer);
    EtlEngine::new(pipeline).run().await
}

fn display_config_summary(config: &SiteConfig, args: &Args) {
    println!("📋 Configuration Summary:");
    println!(
        "  Site: {} (DNAmod {}, ChEBI {})",
        config.site_name(),
        config.dnamod_version(),
        config.chebi_version()
    );
    println!("  Database: {}", config.database_path());
    println!("  Output: {}", config.output_path());
    if config.images_enabled() {
        println!(
            "  Images: {}/ via {} (timeout {:?})",
            config.image_subdir(),
            config.images.obabel_path,
            config.render_timeout()
        );
    } else {
        println!("  Images: disabled");
    }
    println!(
        "  Other: 1 in {} shares {}",
        config.other_ratio(),
        config.other_shared_base()
    );
    println!("  Shaded origins: {}", config.shade_origins().join(", "));

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

async fn perform_dry_run(config: &SiteConfig) -> dnamod_site::Result<()> {
    let settings = DatabaseSettings::from_provider(config);
    let catalogue = tokio::task::spawn_blocking(move || {
        SqliteSource::open(&settings)?.load_catalogue()
    })
    .await
    .map_err(|e| dnamod_site::SiteError::ProcessingError {
        message: format!("database task failed: {}", e),
    })??;

    println!("🔍 Dry Run Analysis:");
    println!();
    println!("📊 Modifications by base (verified / unverified):");
    for base in Nucleobase::ALL {
        println!(
            "  {:<9} {:>4} / {:>4}",
            base.name(),
            catalogue.count_for(base, true),
            catalogue.count_for(base, false)
        );
    }

    println!();
    println!("🌳 Ontology links: {}", catalogue.links.len());
    println!("🔤 Expanded alphabet entries: {}", catalogue.nomenclature.len());
    println!(
        "🗓️ Database last modified: {}",
        catalogue.database_modified.format("%Y-%m-%d")
    );

    let with_smiles = catalogue
        .modifications
        .iter()
        .filter(|m| !dnamod_site::core::nomenclature::strip_sql_quotes(&m.smiles).is_empty())
        .count();
    println!();
    println!("💾 Would write:");
    println!("  {} modification pages + index.html", catalogue.modifications.len());
    if config.images_enabled() {
        println!("  up to {} structure images", with_smiles);
    }

    println!();
    println!("✅ Dry run analysis complete. Use --verbose for more details during actual run.");

    Ok(())
}
