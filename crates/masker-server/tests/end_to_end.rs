use masker_docs::{Desensitize, HttpDesensitizer, PdfParseClient, PdfProcessor, WordProcessor};
use masker_engine::MaskEngine;
use masker_extract::RuleExtractor;
use masker_server::{DocsState, docs, mask};
use std::io::{Cursor, Write};
use std::sync::Arc;
use std::time::Duration;

async fn spawn(app: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn spawn_docs(mask_url: &str) -> String {
    let desensitizer: Arc<dyn Desensitize> =
        Arc::new(HttpDesensitizer::new(mask_url, Duration::from_secs(10)).unwrap());
    // Nothing listens here; only the Word path is exercised.
    let parser = Arc::new(PdfParseClient::new("http://127.0.0.1:9").unwrap());

    let state = DocsState {
        word: Arc::new(WordProcessor::new(desensitizer.clone())),
        pdf: Arc::new(PdfProcessor::new(desensitizer.clone(), parser)),
        desensitizer,
        default_max_chunk_len: 300,
    };
    spawn(docs::router(state, 10 * 1024 * 1024)).await
}

fn docx(xml: &str) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();
    writer.start_file("[Content_Types].xml", options).unwrap();
    writer.write_all(b"<Types/>").unwrap();
    writer.start_file("word/document.xml", options).unwrap();
    writer.write_all(xml.as_bytes()).unwrap();
    writer.finish().unwrap().into_inner()
}

#[tokio::test]
async fn test_word_document_through_both_services() {
    let engine = Arc::new(MaskEngine::new(Arc::new(RuleExtractor::new())));
    let mask_url = spawn(mask::router(engine)).await;
    let docs_url = spawn_docs(&mask_url).await;

    let xml = concat!(
        r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>"#,
        r#"<w:p><w:r><w:t>身份证：11010519491231002X</w:t></w:r></w:p>"#,
        r#"<w:p><w:r><w:t xml:space="preserve">电话 138</w:t></w:r><w:r><w:t>12345678。</w:t></w:r></w:p>"#,
        r#"</w:body></w:document>"#,
    );
    let part = reqwest::multipart::Part::bytes(docx(xml)).file_name("合同.docx");
    let form = reqwest::multipart::Form::new()
        .part("file", part)
        .text("schemalist", r#"["身份证号","手机号码"]"#);

    let response = reqwest::Client::new()
        .post(format!("{}/api/v1/process/word", docs_url))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let bytes = response.bytes().await.unwrap();
    let masked = masker_docs::docx::read_document_xml(&bytes).unwrap();
    assert!(masked.contains("<w:t>身份证：110105194912******</w:t>"));
    assert!(masked.contains(r#"<w:t xml:space="preserve">电话 138</w:t>"#));
    assert!(masked.contains("<w:t>****5678。</w:t>"));
}

#[tokio::test]
async fn test_text_endpoint_reports_unreachable_mask_service() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let dead_url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);
    let docs_url = spawn_docs(&dead_url).await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/v1/mask/text", docs_url))
        .json(&serde_json::json!({ "text": "电话13812345678", "labels": ["手机号码"] }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 502);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["detail"].as_str().unwrap().contains("/mask/custom"));
}
