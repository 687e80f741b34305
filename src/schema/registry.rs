//! Schema registry: startup-time registration, per-frame lookup.

use tracing::debug;

use super::{FrameSchema, builtin};
use crate::error::{DecodeError, Result};

/// Registry of frame schemas, populated at startup and read-only afterward.
///
/// Lookup matches a frame's leading bytes against each schema's preamble and
/// returns candidates ordered newest version first, so the dispatcher tries
/// current formats before legacy ones.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: Vec<FrameSchema>,
}

impl SchemaRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the built-in wire catalogue.
    pub fn builtin() -> Result<Self> {
        let mut registry = Self::new();
        for schema in [
            builtin::conf_v3(),
            builtin::conf_v5(),
            builtin::decay_v1(),
            builtin::decay_v2(),
            builtin::msap_begin_request(),
            builtin::msap_begin_response(),
            builtin::msap_status_request(),
            builtin::msap_status_response_short(),
            builtin::msap_status_response_long(),
        ] {
            registry.register(schema)?;
        }
        Ok(registry)
    }

    /// Register a schema. Fails fast on a duplicate (preamble, version) pair;
    /// registration happens at startup, never on the decode path.
    pub fn register(&mut self, schema: FrameSchema) -> Result<()> {
        if self
            .schemas
            .iter()
            .any(|s| s.preamble == schema.preamble && s.version == schema.version)
        {
            return Err(DecodeError::DuplicateSchema {
                name: schema.name,
                preamble: schema.preamble,
                version: schema.version,
            });
        }
        debug!(schema = schema.name, version = schema.version, "registered frame schema");
        self.schemas.push(schema);
        Ok(())
    }

    /// All schemas whose preamble prefixes `frame`, newest version first.
    /// Empty when the marker bytes match nothing.
    pub fn lookup(&self, frame: &[u8]) -> Vec<&FrameSchema> {
        let mut candidates: Vec<&FrameSchema> =
            self.schemas.iter().filter(|s| frame.starts_with(s.preamble)).collect();
        candidates.sort_by(|a, b| b.version.cmp(&a.version));
        candidates
    }

    /// The minimal leading marker of a frame, for diagnostics: enough bytes
    /// to cover the longest preamble in the registry.
    pub fn marker(&self, frame: &[u8]) -> Vec<u8> {
        let longest = self.schemas.iter().map(|s| s.preamble.len()).max().unwrap_or(1);
        frame[..frame.len().min(longest)].to_vec()
    }

    /// Number of registered schemas.
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}
