use crate::error::DecodeError;
use crate::frame::LuminanceSource;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::{mpsc, oneshot};
use tracing::warn;

#[cfg(feature = "qr")]
mod qr;
#[cfg(feature = "qr")]
pub use qr::QrDecodeEngine;

/// Symbologies a decode engine may be asked to look for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BarcodeFormat {
    #[serde(rename = "UPC_A")]
    UpcA,
    #[serde(rename = "UPC_E")]
    UpcE,
    #[serde(rename = "EAN_13")]
    Ean13,
    #[serde(rename = "EAN_8")]
    Ean8,
    #[serde(rename = "RSS_14")]
    Rss14,
    #[serde(rename = "CODE_39")]
    Code39,
    #[serde(rename = "CODE_93")]
    Code93,
    #[serde(rename = "CODE_128")]
    Code128,
    #[serde(rename = "ITF")]
    Itf,
    #[serde(rename = "CODABAR")]
    Codabar,
    #[serde(rename = "QR_CODE")]
    QrCode,
    #[serde(rename = "DATA_MATRIX")]
    DataMatrix,
    #[serde(rename = "PDF_417")]
    Pdf417,
}

impl BarcodeFormat {
    pub const ALL: [BarcodeFormat; 13] = [
        BarcodeFormat::UpcA,
        BarcodeFormat::UpcE,
        BarcodeFormat::Ean13,
        BarcodeFormat::Ean8,
        BarcodeFormat::Rss14,
        BarcodeFormat::Code39,
        BarcodeFormat::Code93,
        BarcodeFormat::Code128,
        BarcodeFormat::Itf,
        BarcodeFormat::Codabar,
        BarcodeFormat::QrCode,
        BarcodeFormat::DataMatrix,
        BarcodeFormat::Pdf417,
    ];

    fn bit(self) -> u16 {
        1 << (self as u16)
    }
}

impl fmt::Display for BarcodeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BarcodeFormat::UpcA => "UPC-A",
            BarcodeFormat::UpcE => "UPC-E",
            BarcodeFormat::Ean13 => "EAN-13",
            BarcodeFormat::Ean8 => "EAN-8",
            BarcodeFormat::Rss14 => "RSS-14",
            BarcodeFormat::Code39 => "Code 39",
            BarcodeFormat::Code93 => "Code 93",
            BarcodeFormat::Code128 => "Code 128",
            BarcodeFormat::Itf => "ITF",
            BarcodeFormat::Codabar => "Codabar",
            BarcodeFormat::QrCode => "QR Code",
            BarcodeFormat::DataMatrix => "Data Matrix",
            BarcodeFormat::Pdf417 => "PDF417",
        };
        f.write_str(name)
    }
}

/// Enabled symbologies. An empty set means every format is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FormatSet {
    mask: u16,
}

impl FormatSet {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn contains(&self, format: BarcodeFormat) -> bool {
        self.mask == 0 || self.mask & format.bit() != 0
    }

    pub fn insert(&mut self, format: BarcodeFormat) {
        self.mask |= format.bit();
    }

    pub fn is_unrestricted(&self) -> bool {
        self.mask == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = BarcodeFormat> + '_ {
        BarcodeFormat::ALL
            .into_iter()
            .filter(move |format| self.contains(*format))
    }
}

impl FromIterator<BarcodeFormat> for FormatSet {
    fn from_iter<I: IntoIterator<Item = BarcodeFormat>>(iter: I) -> Self {
        let mut set = FormatSet::default();
        for format in iter {
            set.insert(format);
        }
        set
    }
}

/// Decoded payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodeResult {
    pub text: String,
    pub format: BarcodeFormat,
}

impl DecodeResult {
    pub fn new<S: Into<String>>(text: S, format: BarcodeFormat) -> Self {
        Self {
            text: text.into(),
            format,
        }
    }
}

/// Symbol decoder behind the pipeline.
///
/// `Ok(None)` is an ordinary miss. Errors are treated as misses too; the
/// pipeline logs them and moves on to the next frame.
pub trait DecodeEngine: Send {
    fn decode(
        &mut self,
        source: &LuminanceSource<'_>,
        formats: &FormatSet,
    ) -> Result<Option<DecodeResult>, DecodeError>;

    /// Drop any per-attempt state; called after every decode
    fn reset(&mut self) {}
}

/// Receives the result of a successful scan
pub trait DecodeResultSink: Send {
    fn handle_result(&mut self, result: DecodeResult);
}

impl DecodeResultSink for mpsc::UnboundedSender<DecodeResult> {
    fn handle_result(&mut self, result: DecodeResult) {
        if self.send(result).is_err() {
            warn!("Decode result receiver dropped");
        }
    }
}

/// Delivers the first result only; later sessions find the sender spent
impl DecodeResultSink for Option<oneshot::Sender<DecodeResult>> {
    fn handle_result(&mut self, result: DecodeResult) {
        match self.take() {
            Some(tx) => {
                if tx.send(result).is_err() {
                    warn!("Decode result receiver dropped");
                }
            }
            None => warn!("Decode result sink already used, dropping {:?}", result.text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_format_set_allows_everything() {
        let set = FormatSet::all();
        assert!(set.is_unrestricted());
        for format in BarcodeFormat::ALL {
            assert!(set.contains(format));
        }
        assert_eq!(set.iter().count(), 13);
    }

    #[test]
    fn test_format_set_restricts() {
        let set: FormatSet = [BarcodeFormat::QrCode, BarcodeFormat::Ean13].into_iter().collect();
        assert!(set.contains(BarcodeFormat::QrCode));
        assert!(set.contains(BarcodeFormat::Ean13));
        assert!(!set.contains(BarcodeFormat::Code128));
        assert_eq!(
            set.iter().collect::<Vec<_>>(),
            vec![BarcodeFormat::Ean13, BarcodeFormat::QrCode]
        );
    }

    #[test]
    fn test_format_serde_names() {
        let json = serde_json::to_string(&BarcodeFormat::Pdf417).unwrap();
        assert_eq!(json, "\"PDF_417\"");
        let format: BarcodeFormat = serde_json::from_str("\"QR_CODE\"").unwrap();
        assert_eq!(format, BarcodeFormat::QrCode);
    }

    #[tokio::test]
    async fn test_oneshot_sink_delivers_once() {
        let (tx, rx) = oneshot::channel();
        let mut sink = Some(tx);
        sink.handle_result(DecodeResult::new("first", BarcodeFormat::QrCode));
        sink.handle_result(DecodeResult::new("second", BarcodeFormat::QrCode));
        assert_eq!(rx.await.unwrap().text, "first");
    }
}
