//! Static zone-map resource (Tiled JSON export).
//!
//! Only the parts the client needs for collision are modelled; other Tiled
//! keys are ignored on decode.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneMapData {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub layers: Vec<MapLayer>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapLayer {
    pub name: String,
    #[serde(rename = "type", default = "default_layer_type")]
    pub layer_type: String,
    /// Flat tile array indexed `y * width + x`; absent on object layers.
    #[serde(default)]
    pub data: Vec<u32>,
    #[serde(default)]
    pub properties: Vec<LayerProperty>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerProperty {
    pub name: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

fn default_layer_type() -> String {
    "tilelayer".to_string()
}

impl MapLayer {
    pub fn is_tile_layer(&self) -> bool {
        self.layer_type == "tilelayer"
    }

    /// A tile layer counts as collision when it is named `collision` or
    /// carries a `collision = true` custom property.
    pub fn is_collision_layer(&self) -> bool {
        if !self.is_tile_layer() {
            return false;
        }
        self.name.eq_ignore_ascii_case("collision")
            || self
                .properties
                .iter()
                .any(|p| p.name == "collision" && p.value == serde_json::Value::Bool(true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_tiled_export_and_finds_collision_layers() {
        let map: ZoneMapData = serde_json::from_value(serde_json::json!({
            "width": 2,
            "height": 1,
            "tilewidth": 32,
            "layers": [
                {"name": "Ground", "type": "tilelayer", "data": [1, 1]},
                {"name": "Walls", "type": "tilelayer", "data": [0, 5],
                 "properties": [{"name": "collision", "type": "bool", "value": true}]},
                {"name": "COLLISION", "type": "tilelayer", "data": [3, 0]},
                {"name": "warps", "type": "objectgroup", "objects": []}
            ]
        }))
        .unwrap();

        let flags: Vec<bool> = map.layers.iter().map(MapLayer::is_collision_layer).collect();
        assert_eq!(flags, vec![false, true, true, false]);
    }
}
