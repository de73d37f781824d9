//! Engine archive container.
//!
//! Dinver stores both `.param` and `.target` files as a gzip-compressed tar
//! holding a single member, `contents.xml`. The two supported releases differ
//! only in the text encoding of that member and in the tar header flavour:
//!
//! | release | `.param` text      | `.target` text     | tar header |
//! |---------|--------------------|--------------------|------------|
//! | 2.10.1  | UTF-8              | UTF-16LE + BOM     | GNU        |
//! | 3.4.2   | UTF-16LE + BOM     | UTF-16LE + BOM     | ustar      |
//!
//! Reading detects the encoding from the payload itself, so callers only need
//! the version to choose what to write.

use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use tracing::debug;

use crate::domain::GeopsyVersion;
use crate::error::{AppError, Result};

/// Name of the only member inside an engine archive.
pub const MEMBER_NAME: &str = "contents.xml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    /// Little-endian UTF-16 preceded by a byte-order mark.
    Utf16Le,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TarFlavor {
    Gnu,
    Ustar,
}

impl TarFlavor {
    pub fn for_version(version: GeopsyVersion) -> Self {
        match version {
            GeopsyVersion::V2_10_1 => TarFlavor::Gnu,
            GeopsyVersion::V3_4_2 => TarFlavor::Ustar,
        }
    }
}

pub fn encode_text(text: &str, encoding: TextEncoding) -> Vec<u8> {
    match encoding {
        TextEncoding::Utf8 => text.as_bytes().to_vec(),
        TextEncoding::Utf16Le => std::iter::once(0xFEFF_u16)
            .chain(text.encode_utf16())
            .flat_map(u16::to_le_bytes)
            .collect(),
    }
}

/// Decode member bytes, detecting a UTF-16LE or UTF-8 byte-order mark.
pub fn decode_text(bytes: &[u8]) -> Result<(String, TextEncoding)> {
    let looks_utf16 = bytes.starts_with(&[0xFF, 0xFE])
        || (bytes.len() >= 2 && bytes.len() % 2 == 0 && bytes[1] == 0 && bytes[0] != 0);
    if looks_utf16 {
        if bytes.len() % 2 != 0 {
            return Err(AppError::format(
                MEMBER_NAME,
                "an even number of UTF-16 bytes",
                format!("{} bytes", bytes.len()),
            ));
        }
        let units: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        let text = String::from_utf16(&units)
            .map_err(|e| AppError::format(MEMBER_NAME, "UTF-16LE text", e.to_string()))?;
        return Ok((text.trim_start_matches('\u{feff}').to_string(), TextEncoding::Utf16Le));
    }

    let text = std::str::from_utf8(bytes)
        .map_err(|e| AppError::format(MEMBER_NAME, "UTF-8 text", e.to_string()))?;
    Ok((text.trim_start_matches('\u{feff}').to_string(), TextEncoding::Utf8))
}

/// Build the gzip-compressed tar bytes for `text`.
pub fn pack(text: &str, encoding: TextEncoding, flavor: TarFlavor) -> Result<Vec<u8>> {
    let payload = encode_text(text, encoding);
    let tar_err = |e: std::io::Error| AppError::io(MEMBER_NAME, e);

    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);

    let mut header = match flavor {
        TarFlavor::Gnu => tar::Header::new_gnu(),
        TarFlavor::Ustar => tar::Header::new_ustar(),
    };
    header.set_size(payload.len() as u64);
    header.set_mode(0o644);
    header.set_entry_type(tar::EntryType::Regular);
    builder
        .append_data(&mut header, MEMBER_NAME, payload.as_slice())
        .map_err(tar_err)?;

    let encoder = builder.into_inner().map_err(tar_err)?;
    let bytes = encoder.finish().map_err(tar_err)?;
    debug!(payload = payload.len(), compressed = bytes.len(), "packed engine archive");
    Ok(bytes)
}

/// Extract and decode `contents.xml` from gzip-compressed tar bytes.
pub fn unpack(bytes: &[u8]) -> Result<(String, TextEncoding)> {
    let tar_err = |e: std::io::Error| AppError::format("engine archive", "a gzip-compressed tar", e.to_string());

    let mut archive = tar::Archive::new(GzDecoder::new(bytes));
    for entry in archive.entries().map_err(tar_err)? {
        let mut entry = entry.map_err(tar_err)?;
        let is_member = entry
            .path()
            .map(|p| p == Path::new(MEMBER_NAME))
            .unwrap_or(false);
        if !is_member {
            continue;
        }
        let mut payload = Vec::new();
        entry.read_to_end(&mut payload).map_err(tar_err)?;
        debug!(payload = payload.len(), "unpacked engine archive");
        return decode_text(&payload);
    }

    Err(AppError::format(
        "engine archive",
        format!("a member named {MEMBER_NAME}"),
        "none",
    ))
}

pub fn write_archive(path: &Path, text: &str, encoding: TextEncoding, flavor: TarFlavor) -> Result<()> {
    let bytes = pack(text, encoding, flavor)?;
    let mut file = fs::File::create(path).map_err(|e| AppError::io(path, e))?;
    file.write_all(&bytes).map_err(|e| AppError::io(path, e))?;
    Ok(())
}

pub fn read_archive(path: &Path) -> Result<(String, TextEncoding)> {
    let bytes = fs::read(path).map_err(|e| AppError::io(path, e))?;
    unpack(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf16_payload_carries_bom() {
        let bytes = encode_text("<a>", TextEncoding::Utf16Le);
        assert_eq!(&bytes[..4], &[0xFF, 0xFE, b'<', 0]);
        let (text, encoding) = decode_text(&bytes).unwrap();
        assert_eq!(text, "<a>");
        assert_eq!(encoding, TextEncoding::Utf16Le);
    }

    #[test]
    fn pack_then_unpack_preserves_text_for_both_flavors() {
        let text = "<Dinver>\n  <pluginTag>DispersionCurve</pluginTag>\n</Dinver>\n";
        for (encoding, flavor) in [
            (TextEncoding::Utf8, TarFlavor::Gnu),
            (TextEncoding::Utf16Le, TarFlavor::Ustar),
        ] {
            let bytes = pack(text, encoding, flavor).unwrap();
            assert_eq!(&bytes[..2], &[0x1f, 0x8b]);
            assert_eq!(unpack(&bytes).unwrap(), (text.to_string(), encoding));
        }
    }

    #[test]
    fn unpack_rejects_plain_bytes() {
        let err = unpack(b"not an archive").unwrap_err();
        assert!(matches!(err, AppError::Format { .. }));
    }
}
