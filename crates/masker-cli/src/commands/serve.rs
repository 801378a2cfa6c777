use anyhow::Result;
use masker_config::Config;

use crate::cli::Service;

pub async fn handle(service: Service, config: &Config) -> Result<()> {
    match service {
        Service::Mask => masker_server::serve_mask(config).await,
        Service::Docs => masker_server::serve_docs(config).await,
        Service::All => {
            tokio::try_join!(masker_server::serve_mask(config), masker_server::serve_docs(config))?;
            Ok(())
        }
    }
}
