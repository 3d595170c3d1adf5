use crate::config::OutputConfig;
use crate::domain::model::OutputRecord;
use crate::domain::ports::Storage;
use crate::utils::error::{GatewayError, Result};
use serde_json::Value;
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

const DEFAULT_FILENAME_PATTERN: &str = "reddit_output";

/// 將輸出紀錄寫成設定的格式 (json / jsonl / csv)，可選擇打包成 zip
pub struct Exporter<S: Storage> {
    storage: S,
    config: OutputConfig,
}

impl<S: Storage> Exporter<S> {
    pub fn new(storage: S, config: OutputConfig) -> Self {
        Self { storage, config }
    }

    /// 回傳寫入的檔名
    pub async fn export(&self, records: &[OutputRecord]) -> Result<Vec<String>> {
        // 同一次輸出的所有檔名共用一個 timestamp
        let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S").to_string();
        let base_name = expand_pattern(
            self.config
                .filename_pattern
                .as_deref()
                .unwrap_or(DEFAULT_FILENAME_PATTERN),
            &timestamp,
        );

        let mut rendered: Vec<(String, Vec<u8>)> = Vec::new();
        for format in &self.config.output_formats {
            let data = match format.as_str() {
                "json" => render_json(records)?,
                "jsonl" => render_jsonl(records)?,
                "csv" => render_csv(records)?,
                other => {
                    return Err(GatewayError::InvalidConfigValue {
                        field: "output.output_formats".to_string(),
                        value: other.to_string(),
                        reason: "Unsupported format".to_string(),
                    })
                }
            };
            rendered.push((format!("{}.{}", base_name, format), data));
        }

        if self.config.compression_enabled() {
            let zip_name = self
                .config
                .compression
                .as_ref()
                .and_then(|c| c.filename.as_deref())
                .map(|pattern| expand_pattern(pattern, &timestamp))
                .unwrap_or_else(|| format!("{}.zip", base_name));

            tracing::debug!("Creating ZIP file with {} files", rendered.len());
            let zip_data = bundle_zip(&rendered)?;
            tracing::debug!("Writing ZIP file ({} bytes) to storage", zip_data.len());
            self.storage.write_file(&zip_name, &zip_data).await?;
            return Ok(vec![zip_name]);
        }

        let mut written = Vec::with_capacity(rendered.len());
        for (name, data) in rendered {
            tracing::debug!("Writing {} ({} bytes) to storage", name, data.len());
            self.storage.write_file(&name, &data).await?;
            written.push(name);
        }
        Ok(written)
    }
}

fn expand_pattern(pattern: &str, timestamp: &str) -> String {
    pattern.replace("{timestamp}", timestamp)
}

fn render_json(records: &[OutputRecord]) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(records)?)
}

fn render_jsonl(records: &[OutputRecord]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    for record in records {
        serde_json::to_writer(&mut out, record)?;
        out.push(b'\n');
    }
    Ok(out)
}

/// 欄位為所有紀錄頂層 key 的聯集（依首次出現順序）；非物件紀錄放在 `value` 欄
fn render_csv(records: &[OutputRecord]) -> Result<Vec<u8>> {
    let mut headers: Vec<String> = Vec::new();
    for record in records {
        match &record.data {
            Value::Object(map) => {
                for key in map.keys() {
                    if !headers.contains(key) {
                        headers.push(key.clone());
                    }
                }
            }
            _ => {
                if !headers.iter().any(|h| h == "value") {
                    headers.push("value".to_string());
                }
            }
        }
    }

    if headers.is_empty() {
        return Ok(Vec::new());
    }
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&headers)?;

    for record in records {
        let row: Vec<String> = headers
            .iter()
            .map(|header| match &record.data {
                Value::Object(map) => map.get(header).map(cell).unwrap_or_default(),
                other if header == "value" => cell(other),
                _ => String::new(),
            })
            .collect();
        writer.write_record(&row)?;
    }

    writer
        .into_inner()
        .map_err(|e| GatewayError::IoError(e.into_error()))
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn bundle_zip(files: &[(String, Vec<u8>)]) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
    for (name, data) in files {
        zip.start_file::<_, ()>(name.as_str(), FileOptions::default())?;
        zip.write_all(data)?;
    }
    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::toml_config::CompressionConfig;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn new() -> Self {
            Self {
                files: Arc::new(Mutex::new(HashMap::new())),
            }
        }

        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    fn records() -> Vec<OutputRecord> {
        vec![
            OutputRecord::from(json!({"id": "a", "score": 10})),
            OutputRecord::from(json!({"id": "b", "title": "Hello, world", "flags": [1, 2]})),
        ]
    }

    fn output_config(formats: &[&str]) -> OutputConfig {
        OutputConfig {
            output_path: "./unused".to_string(),
            output_formats: formats.iter().map(|f| f.to_string()).collect(),
            filename_pattern: Some("out".to_string()),
            compression: None,
        }
    }

    #[tokio::test]
    async fn test_export_json_and_jsonl() {
        let storage = MockStorage::new();
        let exporter = Exporter::new(storage.clone(), output_config(&["json", "jsonl"]));

        let written = exporter.export(&records()).await.unwrap();
        assert_eq!(written, vec!["out.json", "out.jsonl"]);

        let json_file = storage.get_file("out.json").await.unwrap();
        let parsed: Vec<Value> = serde_json::from_slice(&json_file).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1]["title"], "Hello, world");

        let jsonl_file = String::from_utf8(storage.get_file("out.jsonl").await.unwrap()).unwrap();
        assert_eq!(jsonl_file.lines().count(), 2);
    }

    #[tokio::test]
    async fn test_export_csv_union_of_columns() {
        let storage = MockStorage::new();
        let exporter = Exporter::new(storage.clone(), output_config(&["csv"]));

        exporter.export(&records()).await.unwrap();

        let csv_file = String::from_utf8(storage.get_file("out.csv").await.unwrap()).unwrap();
        let mut lines = csv_file.lines();
        let header = lines.next().unwrap();
        for column in ["id", "score", "title", "flags"] {
            assert!(header.contains(column));
        }
        assert!(csv_file.contains("\"Hello, world\""));
        assert!(csv_file.contains("\"[1,2]\""));
        assert_eq!(lines.count(), 2);
    }

    #[tokio::test]
    async fn test_export_zip_bundle() {
        let storage = MockStorage::new();
        let mut config = output_config(&["json", "csv"]);
        config.compression = Some(CompressionConfig {
            enabled: true,
            filename: Some("bundle.zip".to_string()),
        });
        let exporter = Exporter::new(storage.clone(), config);

        let written = exporter.export(&records()).await.unwrap();
        assert_eq!(written, vec!["bundle.zip"]);

        let zip_data = storage.get_file("bundle.zip").await.unwrap();
        let archive = zip::ZipArchive::new(std::io::Cursor::new(zip_data)).unwrap();
        let names: Vec<&str> = archive.file_names().collect();
        assert!(names.contains(&"out.json"));
        assert!(names.contains(&"out.csv"));
        assert!(storage.get_file("out.json").await.is_none());
    }

    #[test]
    fn test_render_csv_non_object_records() {
        let data = render_csv(&[
            OutputRecord::from(json!("plain")),
            OutputRecord::from(json!(42)),
        ])
        .unwrap();
        let text = String::from_utf8(data).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["value", "plain", "42"]);
    }

    #[test]
    fn test_expand_pattern_timestamp() {
        let name = expand_pattern("reddit_{timestamp}", "20240101_120000");
        assert_eq!(name, "reddit_20240101_120000");
    }

    #[tokio::test]
    async fn test_zip_and_entries_share_timestamp() {
        let storage = MockStorage::new();
        let mut config = output_config(&["json"]);
        config.filename_pattern = Some("reddit_{timestamp}".to_string());
        config.compression = Some(CompressionConfig {
            enabled: true,
            filename: Some("bundle_{timestamp}.zip".to_string()),
        });
        let exporter = Exporter::new(storage.clone(), config);

        let written = exporter.export(&records()).await.unwrap();
        let zip_name = &written[0];
        let stamp = zip_name
            .strip_prefix("bundle_")
            .and_then(|rest| rest.strip_suffix(".zip"))
            .unwrap();

        let zip_data = storage.get_file(zip_name).await.unwrap();
        let archive = zip::ZipArchive::new(std::io::Cursor::new(zip_data)).unwrap();
        let names: Vec<&str> = archive.file_names().collect();
        assert_eq!(names, vec![format!("reddit_{}.json", stamp).as_str()]);
    }
}
