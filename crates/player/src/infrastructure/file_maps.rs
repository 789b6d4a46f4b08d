//! Zone maps read from a local directory (`<dir>/<zone>.json`).
//!
//! Used instead of the HTTP source when `ARGONVALE_MAPS_DIR` is set.

use std::path::PathBuf;

use argonvale_shared::{ZoneId, ZoneMapData};
use async_trait::async_trait;

use crate::ports::outbound::{ApiError, ZoneMapPort};

#[derive(Debug, Clone)]
pub struct FileZoneMapSource {
    dir: PathBuf,
}

impl FileZoneMapSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, zone_id: &ZoneId) -> Result<PathBuf, ApiError> {
        let name = zone_id.as_str();
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            return Err(ApiError::NotFound(format!("invalid zone id {name:?}")));
        }
        Ok(self.dir.join(format!("{name}.json")))
    }
}

#[async_trait]
impl ZoneMapPort for FileZoneMapSource {
    async fn fetch_zone_map(&self, zone_id: &ZoneId) -> Result<ZoneMapData, ApiError> {
        let path = self.path_for(zone_id)?;
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ApiError::NotFound(path.display().to_string()));
            }
            Err(e) => return Err(ApiError::Storage(format!("{}: {e}", path.display()))),
        };
        serde_json::from_str(&raw).map_err(|e| ApiError::Decode(format!("{}: {e}", path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn loads_map_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("town.json"),
            r#"{"width":2,"height":2,"layers":[{"name":"collision","type":"tilelayer","data":[0,1,0,0]}]}"#,
        )
        .unwrap();

        let source = FileZoneMapSource::new(dir.path());
        let map = source.fetch_zone_map(&ZoneId::from("town")).await.unwrap();
        assert_eq!((map.width, map.height), (2, 2));
        assert_eq!(map.layers[0].data, vec![0, 1, 0, 0]);
    }

    #[tokio::test]
    async fn missing_map_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileZoneMapSource::new(dir.path());
        let err = source.fetch_zone_map(&ZoneId::from("wild")).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn zone_ids_cannot_escape_the_directory() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileZoneMapSource::new(dir.path());
        let err = source
            .fetch_zone_map(&ZoneId::from("../secrets"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn bad_json_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("town.json"), "{").unwrap();
        let source = FileZoneMapSource::new(dir.path());
        let err = source.fetch_zone_map(&ZoneId::from("town")).await.unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }
}
