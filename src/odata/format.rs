//! Response format negotiation (`$format` and `Accept`). Only JSON is produced.

use crate::error::AppError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetadataLevel {
    Minimal,
    None,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResponseFormat {
    pub metadata: MetadataLevel,
}

impl Default for ResponseFormat {
    fn default() -> Self {
        ResponseFormat {
            metadata: MetadataLevel::Minimal,
        }
    }
}

impl ResponseFormat {
    pub fn content_type(&self) -> &'static str {
        match self.metadata {
            MetadataLevel::Minimal => "application/json;odata.metadata=minimal",
            MetadataLevel::None => "application/json;odata.metadata=none",
        }
    }

    pub fn with_context(&self) -> bool {
        self.metadata == MetadataLevel::Minimal
    }
}

/// Parse one media range. `Ok(None)` means "not JSON", an error means JSON with unusable parameters.
fn json_media_range(range: &str) -> Result<Option<ResponseFormat>, AppError> {
    let mut parts = range.split(';').map(str::trim);
    let media = parts.next().unwrap_or("").to_ascii_lowercase();
    if !matches!(media.as_str(), "application/json" | "application/*" | "*/*" | "json") {
        return Ok(None);
    }
    let mut format = ResponseFormat::default();
    for param in parts {
        let Some((name, value)) = param.split_once('=') else { continue };
        let name = name.trim().to_ascii_lowercase();
        if name == "odata.metadata" || name == "metadata" {
            format.metadata = match value.trim().to_ascii_lowercase().as_str() {
                "minimal" => MetadataLevel::Minimal,
                "none" => MetadataLevel::None,
                other => {
                    return Err(AppError::NotAcceptable(format!("odata.metadata={} is not supported", other)))
                }
            };
        }
    }
    Ok(Some(format))
}

/// `$format` wins over `Accept`; no preference means minimal JSON.
pub fn negotiate(format_option: Option<&str>, accept: Option<&str>) -> Result<ResponseFormat, AppError> {
    if let Some(requested) = format_option {
        return json_media_range(requested)?
            .ok_or_else(|| AppError::NotAcceptable(format!("format '{}' is not supported", requested)));
    }
    let Some(accept) = accept.filter(|a| !a.trim().is_empty()) else {
        return Ok(ResponseFormat::default());
    };
    for range in accept.split(',') {
        if let Some(format) = json_media_range(range)? {
            return Ok(format);
        }
    }
    Err(AppError::NotAcceptable(format!("no supported media type in '{}'", accept)))
}
