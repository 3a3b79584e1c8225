//! Events pushed to the UI over the renderer event channel.

use serde::{Deserialize, Serialize};

use crate::error::{TexlinkError, TexlinkResult};
use crate::types::TextureId;

/// A message for the UI layer. Serializes to a flat key/value map with a
/// `type` discriminator, e.g.
/// `{"type":"update","textureID":3,"width":1280,"height":720,"isMirror":1}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RendererEvent {
    /// The dimensions or mirror state of a surface changed.
    Update {
        #[serde(rename = "textureID")]
        texture_id: TextureId,
        width: u32,
        height: u32,
        /// 1 when mirrored, 0 otherwise. Absent for sources without a flip mode.
        #[serde(rename = "isMirror", default, skip_serializing_if = "Option::is_none")]
        is_mirror: Option<i32>,
    },
}

impl RendererEvent {
    pub fn update(texture_id: TextureId, width: u32, height: u32, is_mirror: Option<bool>) -> Self {
        RendererEvent::Update {
            texture_id,
            width,
            height,
            is_mirror: is_mirror.map(i32::from),
        }
    }

    /// The key/value payload handed to the event channel transport.
    pub fn to_map(&self) -> TexlinkResult<serde_json::Map<String, serde_json::Value>> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(map) => Ok(map),
            other => Err(TexlinkError::Other(format!(
                "renderer event serialized to a non-object: {}",
                other
            ))),
        }
    }
}
