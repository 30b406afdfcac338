//! Icon sniffing: only 20x20 PNGs are accepted.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Required icon width and height in pixels.
pub const ICON_SIZE: u32 = 20;

const PNG_SIGNATURE: &[u8] = b"PNG\r\n\x1a\n";
const IHDR: &[u8] = b"IHDR";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconType {
    Png,
}

impl IconType {
    pub fn mime_subtype(self) -> &'static str {
        match self {
            IconType::Png => "png",
        }
    }
}

fn read_u32_be(bytes: &[u8], offset: usize) -> Option<u32> {
    let raw = bytes.get(offset..offset + 4)?;
    Some(u32::from_be_bytes(raw.try_into().ok()?))
}

/// Returns the icon type when `bytes` is a PNG whose IHDR declares 20x20.
pub fn sniff_icon(bytes: &[u8]) -> Option<IconType> {
    if bytes.get(1..8)? != PNG_SIGNATURE {
        return None;
    }
    if bytes.get(12..16)? != IHDR {
        return None;
    }
    let width = read_u32_be(bytes, 16)?;
    let height = read_u32_be(bytes, 20)?;
    (width == ICON_SIZE && height == ICON_SIZE).then_some(IconType::Png)
}

/// `data:image/png;base64,...` for a valid icon.
pub fn icon_data_uri(bytes: &[u8]) -> Option<String> {
    let icon_type = sniff_icon(bytes)?;
    Some(format!(
        "data:image/{};base64,{}",
        icon_type.mime_subtype(),
        STANDARD.encode(bytes)
    ))
}

#[cfg(test)]
pub(crate) fn png_header(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = vec![0x89];
    bytes.extend_from_slice(PNG_SIGNATURE);
    bytes.extend_from_slice(&13u32.to_be_bytes());
    bytes.extend_from_slice(IHDR);
    bytes.extend_from_slice(&width.to_be_bytes());
    bytes.extend_from_slice(&height.to_be_bytes());
    // bit depth, colour type, compression, filter, interlace, crc
    bytes.extend_from_slice(&[8, 6, 0, 0, 0, 0, 0, 0, 0]);
    bytes
}
