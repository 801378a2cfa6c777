use anyhow::Result;
use masker_config::Config;
use masker_engine::MaskRequest;

pub async fn handle(
    config: &Config,
    text: String,
    labels: Vec<String>,
    custom: String,
    max_chunk_len: Option<usize>,
) -> Result<()> {
    let engine = masker_server::build_engine(config)?;

    let mut request = MaskRequest::new(text, super::resolve_labels(&labels, &custom));
    if let Some(len) = max_chunk_len {
        request = request.with_max_chunk_len(len);
    }

    let response = engine.mask(&request).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);

    Ok(())
}
