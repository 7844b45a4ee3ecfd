use std::path::{Path, PathBuf};

use url::Url;

use crate::error::SourceError;

/// Where a catalog or model comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AssetSource {
    File(PathBuf),
    Http(Url),
}

impl AssetSource {
    /// Plain paths, `file://` URLs and `http(s)://` URLs.
    pub fn parse(source: &str) -> Result<Self, SourceError> {
        let unsupported = || SourceError::Unsupported(source.to_string());

        if !source.contains("://") {
            return Ok(AssetSource::File(PathBuf::from(source)));
        }

        let url = Url::parse(source).map_err(|_| unsupported())?;
        match url.scheme() {
            "http" | "https" => Ok(AssetSource::Http(url)),
            "file" => url
                .to_file_path()
                .map(AssetSource::File)
                .map_err(|_| unsupported()),
            _ => Err(unsupported()),
        }
    }

    /// Last path segment, used for log lines.
    pub fn filename(&self) -> String {
        match self {
            AssetSource::File(path) => path
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or_default()
                .to_string(),
            AssetSource::Http(url) => url
                .path_segments()
                .and_then(|mut segments| segments.next_back())
                .unwrap_or_default()
                .to_string(),
        }
    }

    pub async fn read_bytes(&self) -> Result<Vec<u8>, SourceError> {
        match self {
            AssetSource::File(path) => read_file(path).await,
            AssetSource::Http(url) => fetch(url).await,
        }
    }
}

async fn read_file(path: &Path) -> Result<Vec<u8>, SourceError> {
    tokio::fs::read(path).await.map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })
}

async fn fetch(url: &Url) -> Result<Vec<u8>, SourceError> {
    let url_string = url.to_string();
    let request = ehttp::Request::get(url.as_str());

    // ehttp's blocking client, kept off the async workers
    let response = tokio::task::spawn_blocking(move || ehttp::fetch_blocking(&request))
        .await
        .map_err(|e| SourceError::Http {
            url: url_string.clone(),
            reason: e.to_string(),
        })?
        .map_err(|reason| SourceError::Http {
            url: url_string.clone(),
            reason,
        })?;

    if !response.ok {
        return Err(SourceError::HttpStatus {
            url: url_string,
            status: response.status,
            status_text: response.status_text,
        });
    }

    Ok(response.bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_sources() {
        assert_eq!(
            AssetSource::parse("assets/material.data.json").unwrap(),
            AssetSource::File(PathBuf::from("assets/material.data.json"))
        );
        assert!(matches!(
            AssetSource::parse("https://example.com/models/sofa.glb").unwrap(),
            AssetSource::Http(_)
        ));
        assert!(matches!(
            AssetSource::parse("ftp://example.com/x.json"),
            Err(SourceError::Unsupported(_))
        ));
    }

    #[test]
    fn filename_is_last_segment() {
        let source = AssetSource::parse("https://example.com/models/sofa.glb").unwrap();
        assert_eq!(source.filename(), "sofa.glb");
        let source = AssetSource::parse("assets/chair.gltf").unwrap();
        assert_eq!(source.filename(), "chair.gltf");
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let source = AssetSource::File(std::env::temp_dir().join("tailor-does-not-exist.json"));
        assert!(matches!(source.read_bytes().await, Err(SourceError::Io { .. })));
    }
}
