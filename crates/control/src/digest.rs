use crate::error::ControlFileError;

/// Whole-file digest recorded in a control file header.
///
/// The source format has historically carried an MD4 digest and newer
/// control files may additionally (or instead) carry a SHA-1 digest; a
/// conforming reader accepts whichever the header specifies.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WholeFileDigest {
    /// 128-bit MD4 digest, hex-decoded from the `MD4` header key.
    Md4([u8; 16]),
    /// 160-bit SHA-1 digest, hex-decoded from the `SHA-1` header key.
    Sha1([u8; 20]),
}

impl WholeFileDigest {
    pub(crate) fn parse_md4(hex: &str) -> Result<Self, ControlFileError> {
        let bytes = decode_hex(hex, 16)?;
        let mut digest = [0u8; 16];
        digest.copy_from_slice(&bytes);
        Ok(Self::Md4(digest))
    }

    pub(crate) fn parse_sha1(hex: &str) -> Result<Self, ControlFileError> {
        let bytes = decode_hex(hex, 20)?;
        let mut digest = [0u8; 20];
        digest.copy_from_slice(&bytes);
        Ok(Self::Sha1(digest))
    }

    /// Returns the raw digest bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Md4(bytes) => bytes,
            Self::Sha1(bytes) => bytes,
        }
    }
}

fn decode_hex(hex: &str, expected_len: usize) -> Result<Vec<u8>, ControlFileError> {
    let hex = hex.trim();
    if hex.len() != expected_len * 2 {
        return Err(ControlFileError::Header {
            reason: format!(
                "whole-file digest has {} hex characters, expected {}",
                hex.len(),
                expected_len * 2
            ),
        });
    }

    (0..hex.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| ControlFileError::Header {
                reason: format!("invalid hex digit in digest at offset {i}"),
            })
        })
        .collect()
}
