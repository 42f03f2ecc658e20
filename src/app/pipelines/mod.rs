pub mod site_pipeline;

pub use site_pipeline::SitePipeline;
