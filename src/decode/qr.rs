use super::{BarcodeFormat, DecodeEngine, DecodeResult, FormatSet};
use crate::error::DecodeError;
use crate::frame::LuminanceSource;
use rqrr::PreparedImage;
use tracing::{debug, trace};

/// QR-only decode engine built on `rqrr`
#[derive(Debug, Default)]
pub struct QrDecodeEngine {
    attempts: u64,
}

impl QrDecodeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempts(&self) -> u64 {
        self.attempts
    }
}

impl DecodeEngine for QrDecodeEngine {
    fn decode(
        &mut self,
        source: &LuminanceSource<'_>,
        formats: &FormatSet,
    ) -> Result<Option<DecodeResult>, DecodeError> {
        if !formats.contains(BarcodeFormat::QrCode) {
            return Ok(None);
        }
        self.attempts += 1;

        let mut img = PreparedImage::prepare_from_greyscale(
            source.width() as usize,
            source.height() as usize,
            |x, y| source.pixel(x as u32, y as u32),
        );
        let grids = img.detect_grids();
        trace!("rqrr found {} candidate grids", grids.len());

        let Some(grid) = grids.first() else {
            return Ok(None);
        };

        match grid.decode() {
            Ok((_, content)) => {
                debug!("Decoded QR code ({} chars)", content.len());
                Ok(Some(DecodeResult::new(content, BarcodeFormat::QrCode)))
            }
            Err(e) => Err(DecodeError::Format {
                details: e.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_frame_is_a_miss() {
        let data = vec![255u8; 64 * 64];
        let source = LuminanceSource::new(&data, 64, 64, 8, 8, 48, 48).unwrap();
        let mut engine = QrDecodeEngine::new();
        assert_eq!(engine.decode(&source, &FormatSet::all()), Ok(None));
        assert_eq!(engine.attempts(), 1);
    }

    #[test]
    fn test_disabled_format_skips_work() {
        let data = vec![0u8; 16];
        let source = LuminanceSource::new(&data, 4, 4, 0, 0, 4, 4).unwrap();
        let formats: FormatSet = [BarcodeFormat::Ean13].into_iter().collect();
        let mut engine = QrDecodeEngine::new();
        assert_eq!(engine.decode(&source, &formats), Ok(None));
        assert_eq!(engine.attempts(), 0);
    }
}
