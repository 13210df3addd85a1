use crate::diagnostics::Diagnostic;
use crate::emit::map::AssetMap;
use crate::error::ArtifactError;
use bincode::config::standard;
use bincode::serde::{decode_from_slice, encode_to_vec};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{Read, Write};

/// Everything a build produces, persisted together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildArtifacts {
    /// The relocation-free binary loaded by the VM.
    pub blob: Vec<u8>,
    pub map: AssetMap,
    /// Generated C enumerations for host code.
    pub defs: String,
    pub diagnostics: Vec<Diagnostic>,
}

impl BuildArtifacts {
    /// Whether any error was reported during the build.
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// Saves the artifacts to a file using the bincode format.
    pub fn save(&self, path: &str) -> Result<(), ArtifactError> {
        let bytes = encode_to_vec(self, standard()).map_err(|e| ArtifactError::Encode(e.to_string()))?;
        write_file(path, &bytes)
    }

    /// Writes only the blob, raw.
    pub fn write_blob(&self, path: &str) -> Result<(), ArtifactError> {
        write_file(path, &self.blob)
    }

    /// Loads artifacts previously written with `save`.
    pub fn from_file(path: &str) -> Result<Self, ArtifactError> {
        let mut file = fs::File::open(path).map_err(|source| ArtifactError::Io {
            path: path.to_string(),
            source,
        })?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)
            .map_err(|source| ArtifactError::Io {
                path: path.to_string(),
                source,
            })?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ArtifactError> {
        decode_from_slice(bytes, standard())
            .map(|(artifacts, _)| artifacts) // bincode 2 returns (data, bytes_read)
            .map_err(|e| ArtifactError::Decode(e.to_string()))
    }
}

fn write_file(path: &str, bytes: &[u8]) -> Result<(), ArtifactError> {
    let mut file = fs::File::create(path).map_err(|source| ArtifactError::Io {
        path: path.to_string(),
        source,
    })?;
    file.write_all(bytes).map_err(|source| ArtifactError::Io {
        path: path.to_string(),
        source,
    })
}
