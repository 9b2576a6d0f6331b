//! PDF text extraction using `pdftotext` (poppler-utils).

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use talenta_core::defaults::EXTRACTION_CMD_TIMEOUT_SECS;
use talenta_core::{Error, ExtractedText, Result, TextExtractor};

/// Extracts text from stored PDF documents with `pdftotext`, using
/// `pdfinfo` for the page count. Each external invocation is guarded by a
/// per-command timeout.
pub struct PdfTextExtractor;

/// Parse the page count out of `pdfinfo` output.
fn parse_page_count(output: &str) -> usize {
    output
        .lines()
        .find_map(|line| {
            let (key, value) = line.split_once(':')?;
            if key.trim().eq_ignore_ascii_case("pages") {
                value.trim().parse::<usize>().ok()
            } else {
                None
            }
        })
        .unwrap_or(0)
}

/// Run a command with a timeout, returning stdout as a string.
async fn run_cmd_with_timeout(cmd: &mut Command, timeout_secs: u64) -> Result<String> {
    let output = tokio::time::timeout(std::time::Duration::from_secs(timeout_secs), cmd.output())
        .await
        .map_err(|_| {
            Error::Extraction(format!(
                "External command timed out after {}s",
                timeout_secs
            ))
        })?
        .map_err(|e| Error::Extraction(format!("Failed to execute command: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::Extraction(format!(
            "Command failed (exit {}): {}",
            output.status,
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[async_trait]
impl TextExtractor for PdfTextExtractor {
    async fn extract_text(&self, path: &str) -> Result<ExtractedText> {
        if !std::path::Path::new(path).is_file() {
            return Err(Error::Extraction(format!(
                "Document not found on disk: {}",
                path
            )));
        }

        // Page count is informational; a pdfinfo failure doesn't abort.
        let page_count = match run_cmd_with_timeout(
            Command::new("pdfinfo").arg(path),
            EXTRACTION_CMD_TIMEOUT_SECS,
        )
        .await
        {
            Ok(output) => parse_page_count(&output),
            Err(e) => {
                warn!(path, error = %e, "pdfinfo failed, page count unavailable");
                0
            }
        };

        let text = run_cmd_with_timeout(
            Command::new("pdftotext").arg(path).arg("-"),
            EXTRACTION_CMD_TIMEOUT_SECS,
        )
        .await?;

        debug!(
            subsystem = "jobs",
            op = "extract_text",
            path,
            text_len = text.len(),
            page_count,
            "Text extracted"
        );

        Ok(ExtractedText { text, page_count })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_page_count() {
        let output = "Title:          CV\nAuthor:         \nPages:          3\nEncrypted:      no\n";
        assert_eq!(parse_page_count(output), 3);
    }

    #[test]
    fn test_parse_page_count_missing() {
        assert_eq!(parse_page_count("Title: something\n"), 0);
        assert_eq!(parse_page_count(""), 0);
    }

    #[test]
    fn test_parse_page_count_malformed_value() {
        assert_eq!(parse_page_count("Pages: many\n"), 0);
    }

    #[tokio::test]
    async fn test_missing_file_is_extraction_error() {
        let extractor = PdfTextExtractor;
        let err = extractor
            .extract_text("/nonexistent/candidate.pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Extraction(_)));
    }
}
