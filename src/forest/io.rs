use std::fs;
use std::path::Path;

use tracing::{debug, debug_span};

use super::{Forest, ForestError};

pub(crate) const MAGIC: &[u8; 4] = b"CKFB";
pub(crate) const VERSION: u8 = 1;
/// magic(4) + version(1) + reserved(3) + crc32(4)
pub(crate) const HEADER_SIZE: usize = 12;

impl Forest {
    pub fn from_json(text: &str) -> Result<Self, ForestError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String, ForestError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Serialize to the binary forest format (CKFB).
    pub fn to_bytes(&self) -> Result<Vec<u8>, ForestError> {
        let body = bincode::serialize(self).map_err(ForestError::Serialize)?;
        let checksum = crc32fast::hash(&body);

        let mut buf = Vec::with_capacity(HEADER_SIZE + body.len());
        buf.extend_from_slice(MAGIC);
        buf.push(VERSION);
        buf.extend_from_slice(&[0u8; 3]); // reserved
        buf.extend_from_slice(&checksum.to_le_bytes());
        buf.extend_from_slice(&body);
        Ok(buf)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, ForestError> {
        if data.len() < 5 {
            return Err(ForestError::InvalidHeader);
        }
        if &data[..4] != MAGIC {
            return Err(ForestError::InvalidMagic);
        }
        if data[4] != VERSION {
            return Err(ForestError::UnsupportedVersion(data[4]));
        }
        if data.len() < HEADER_SIZE {
            return Err(ForestError::InvalidHeader);
        }

        let mut crc = [0u8; 4];
        crc.copy_from_slice(&data[8..12]);
        let expected = u32::from_le_bytes(crc);
        let body = &data[HEADER_SIZE..];
        let found = crc32fast::hash(body);
        if expected != found {
            return Err(ForestError::Checksum { expected, found });
        }

        bincode::deserialize(body).map_err(ForestError::Deserialize)
    }

    /// Open a forest file. Binary files are recognised by their magic bytes;
    /// anything else is parsed as JSON.
    pub fn open(path: &Path) -> Result<Self, ForestError> {
        let _span = debug_span!("forest_load", path = %path.display()).entered();
        let data = fs::read(path)?;
        let forest = if data.starts_with(MAGIC) {
            Self::from_bytes(&data)?
        } else {
            let text = String::from_utf8(data).map_err(|e| {
                ForestError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
            })?;
            Self::from_json(&text)?
        };
        debug!(nodes = forest.len(), tops = forest.tops.len());
        Ok(forest)
    }

    /// Atomic write: write to .tmp then rename. A `.json` extension selects
    /// JSON, anything else the binary format.
    pub fn save(&self, path: &Path) -> Result<(), ForestError> {
        let bytes = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => self.to_json()?.into_bytes(),
            _ => self.to_bytes()?,
        };
        let tmp = path.with_extension("tmp");
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&tmp, &bytes)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}
