//! Truevision TGA decoder for uncompressed (type 2) and RLE (type 10)
//! truecolor images, 24 or 32 bits per pixel.

use std::sync::Arc;

use crate::{
    error::{AssetError, AssetResult},
    pixels::{BYTES_PER_PIXEL, PixelPool, RawPixelBuffer},
};

pub const TGA_HEADER_LEN: usize = 18;

/// Descriptor bit set when row 0 is the top of the image.
const DESCRIPTOR_TOP_ORIGIN: u8 = 0x20;
const RLE_RUN_FLAG: u8 = 0x80;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TgaImageType {
    Truecolor,
    RleTruecolor,
}

impl TgaImageType {
    fn from_code(code: u8) -> AssetResult<Self> {
        match code {
            2 => Ok(TgaImageType::Truecolor),
            10 => Ok(TgaImageType::RleTruecolor),
            other => Err(AssetError::Format(format!(
                "Unsupported TGA image type {other} (only 2 and 10 are supported)"
            ))),
        }
    }
}

/// Fixed 18-byte TGA header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TgaHeader {
    pub id_length: u8,
    pub color_map_type: u8,
    pub image_type: TgaImageType,
    pub color_map_length: u16,
    pub color_map_entry_size: u8,
    pub width: u16,
    pub height: u16,
    pub pixel_depth: u8,
    pub descriptor: u8,
}

impl TgaHeader {
    pub fn parse(bytes: &[u8]) -> AssetResult<Self> {
        let h: &[u8; TGA_HEADER_LEN] = bytes
            .get(..TGA_HEADER_LEN)
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| {
                AssetError::Format(format!(
                    "TGA header truncated ({} of {} bytes)",
                    bytes.len(),
                    TGA_HEADER_LEN
                ))
            })?;

        let le = |i: usize| u16::from_le_bytes([h[i], h[i + 1]]);
        let color_map_type = h[1];
        // A color map next to truecolor data is unused; skip it, but only
        // for the one map type the format defines.
        if color_map_type > 1 {
            return Err(AssetError::Format(format!(
                "Unknown TGA color map type {color_map_type}"
            )));
        }

        let header = Self {
            id_length: h[0],
            color_map_type,
            image_type: TgaImageType::from_code(h[2])?,
            color_map_length: le(5),
            color_map_entry_size: h[7],
            width: le(12),
            height: le(14),
            pixel_depth: h[16],
            descriptor: h[17],
        };

        if header.pixel_depth != 24 && header.pixel_depth != 32 {
            return Err(AssetError::Format(format!(
                "Unsupported TGA pixel depth {} (expected 24 or 32)",
                header.pixel_depth
            )));
        }
        if header.width == 0 || header.height == 0 {
            return Err(AssetError::Format(format!(
                "TGA image has zero size ({}x{})",
                header.width, header.height
            )));
        }
        Ok(header)
    }

    #[inline]
    pub fn is_top_down(&self) -> bool {
        self.descriptor & DESCRIPTOR_TOP_ORIGIN != 0
    }

    #[inline]
    pub fn source_bytes_per_pixel(&self) -> usize {
        usize::from(self.pixel_depth / 8)
    }

    /// Fewest body bytes that can encode the declared image: every pixel
    /// for raw data, one full 128-pixel run packet after another for RLE.
    pub fn min_body_len(&self) -> usize {
        let pixels = usize::from(self.width) * usize::from(self.height);
        let bpp = self.source_bytes_per_pixel();
        match self.image_type {
            TgaImageType::Truecolor => pixels * bpp,
            TgaImageType::RleTruecolor => pixels.div_ceil(128) * (1 + bpp),
        }
    }

    /// Bytes between the header and the first pixel.
    pub fn data_offset(&self) -> usize {
        let color_map = if self.color_map_type == 1 {
            (usize::from(self.color_map_length) * usize::from(self.color_map_entry_size))
                .div_ceil(8)
        } else {
            0
        };
        TGA_HEADER_LEN + usize::from(self.id_length) + color_map
    }
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> AssetResult<&'a [u8]> {
        let end = self.pos + n;
        let slice = self.bytes.get(self.pos..end).ok_or_else(|| {
            AssetError::Format(format!(
                "TGA data truncated at byte {} (needed {} more)",
                self.pos, n
            ))
        })?;
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self) -> AssetResult<u8> {
        Ok(self.take(1)?[0])
    }

    fn pixel(&mut self, bytes_per_pixel: usize) -> AssetResult<[u8; 4]> {
        let src = self.take(bytes_per_pixel)?;
        let alpha = if bytes_per_pixel == 4 { src[3] } else { 255 };
        Ok([src[0], src[1], src[2], alpha])
    }
}

/// Writes pixels given in source order into top-down destination rows.
struct RowWriter<'a> {
    dst: &'a mut [u8],
    width: usize,
    height: usize,
    flip: bool,
    written: usize,
}

impl RowWriter<'_> {
    fn total(&self) -> usize {
        self.width * self.height
    }

    fn is_full(&self) -> bool {
        self.written == self.total()
    }

    fn put(&mut self, px: [u8; 4], count: usize) -> AssetResult<()> {
        if self.written + count > self.total() {
            return Err(AssetError::Format(format!(
                "TGA packet of {} pixels overflows image at pixel {} of {}",
                count,
                self.written,
                self.total()
            )));
        }
        for _ in 0..count {
            let (y, x) = (self.written / self.width, self.written % self.width);
            let row = if self.flip { self.height - 1 - y } else { y };
            let at = (row * self.width + x) * BYTES_PER_PIXEL;
            self.dst[at..at + BYTES_PER_PIXEL].copy_from_slice(&px);
            self.written += 1;
        }
        Ok(())
    }
}

/// Decode a TGA byte stream into a top-down BGRA8 buffer rented from `pool`.
pub fn decode_tga(bytes: &[u8], pool: &Arc<PixelPool>) -> AssetResult<RawPixelBuffer> {
    let header = TgaHeader::parse(bytes)?;
    let mut reader = Reader {
        bytes,
        pos: TGA_HEADER_LEN,
    };
    reader.take(header.data_offset() - TGA_HEADER_LEN)?;

    // Reject before renting: the header alone can claim gigabytes.
    let body_len = bytes.len() - reader.pos;
    if body_len < header.min_body_len() {
        return Err(AssetError::Format(format!(
            "TGA body truncated: {}x{} needs at least {} bytes, got {}",
            header.width,
            header.height,
            header.min_body_len(),
            body_len
        )));
    }

    let bpp = header.source_bytes_per_pixel();
    let mut buffer =
        RawPixelBuffer::pooled(pool, u32::from(header.width), u32::from(header.height));
    let mut out = RowWriter {
        dst: buffer.pixels_mut()?,
        width: usize::from(header.width),
        height: usize::from(header.height),
        flip: !header.is_top_down(),
        written: 0,
    };

    match header.image_type {
        TgaImageType::Truecolor => {
            while !out.is_full() {
                let px = reader.pixel(bpp)?;
                out.put(px, 1)?;
            }
        }
        TgaImageType::RleTruecolor => {
            while !out.is_full() {
                let packet = reader.u8()?;
                let count = usize::from(packet & !RLE_RUN_FLAG) + 1;
                if packet & RLE_RUN_FLAG != 0 {
                    let px = reader.pixel(bpp)?;
                    out.put(px, count)?;
                } else {
                    for _ in 0..count {
                        let px = reader.pixel(bpp)?;
                        out.put(px, 1)?;
                    }
                }
            }
        }
    }

    log::debug!(
        "Decoded TGA {}x{} ({:?}, {} bpp, {})",
        header.width,
        header.height,
        header.image_type,
        header.pixel_depth,
        if header.is_top_down() { "top-down" } else { "bottom-up" }
    );
    Ok(buffer)
}
