//! Shipping label artifacts.
//!
//! Labels arrive base64-encoded inside the ship response. They are decoded
//! and written under the label directory as `<shipment_id>.<ext>`, and the
//! relative reference `shipment_labels/<file>` is handed back for storage.

use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::{info, warn};

/// URL prefix under which saved labels are served.
pub const LABEL_PREFIX: &str = "shipment_labels";

const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";
const GIF_MAGIC: &[u8] = b"GIF8";

/// Writes decoded label images to a directory.
#[derive(Debug, Clone)]
pub struct LabelStore {
    dir: PathBuf,
}

impl LabelStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Decode and save a label. Returns the relative reference.
    ///
    /// A label that cannot be decoded or written is logged and dropped;
    /// the shipment it belongs to still stands.
    pub async fn save(&self, shipment_id: &str, encoded: &str) -> Option<String> {
        let bytes = match STANDARD.decode(encoded.trim()) {
            Ok(bytes) if !bytes.is_empty() => bytes,
            Ok(_) => {
                warn!(shipment_id, "carrier returned an empty label");
                return None;
            }
            Err(e) => {
                warn!(shipment_id, error = %e, "label is not valid base64");
                return None;
            }
        };

        let Some(ext) = image_extension(&bytes) else {
            warn!(shipment_id, "label is neither PNG nor GIF");
            return None;
        };

        let stem = file_stem(shipment_id)?;
        let file_name = format!("{stem}.{ext}");

        if let Err(e) = tokio::fs::create_dir_all(&self.dir).await {
            warn!(dir = %self.dir.display(), error = %e, "cannot create label directory");
            return None;
        }
        if let Err(e) = tokio::fs::write(self.dir.join(&file_name), &bytes).await {
            warn!(shipment_id, error = %e, "failed to write label");
            return None;
        }

        info!(shipment_id, file = %file_name, "saved shipping label");
        Some(format!("{LABEL_PREFIX}/{file_name}"))
    }
}

fn image_extension(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(PNG_MAGIC) {
        Some("png")
    } else if bytes.starts_with(GIF_MAGIC) {
        Some("gif")
    } else {
        None
    }
}

/// Shipment ids become file names, so only keep safe characters.
fn file_stem(shipment_id: &str) -> Option<String> {
    let stem: String = shipment_id
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    if stem.is_empty() {
        warn!(shipment_id, "shipment id unusable as a label file name");
        return None;
    }
    Some(stem)
}
