//! Drop contexts and the data sources behind them

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Data formats a drag payload can offer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DropFormat {
    /// A list of file system paths
    Files,
    /// Plain or Unicode text
    Text,
    /// Bitmap data
    Image,
}

/// Why a drop payload could not be materialized
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DropDataError {
    /// The payload does not carry this format
    #[error("drag payload has no {0:?} data")]
    FormatUnavailable(DropFormat),

    /// The OS refused to hand out the data
    #[error("could not lock drag payload memory")]
    LockFailed,

    /// No data source is reachable from this callback
    #[error("no data source attached to this drop callback")]
    NoDataSource,

    /// The format exists but holds nothing usable
    #[error("drag payload is empty")]
    Empty,
}

/// Read access to a drag payload, as offered by the OS.
///
/// [`formats`](Self::formats) must be cheap; the `read_*` methods may copy or
/// convert data.
pub trait DataSource {
    /// Formats currently available
    fn formats(&self) -> Vec<DropFormat>;

    /// Materialize the file list
    fn read_files(&self) -> Result<Vec<PathBuf>, DropDataError>;

    /// Materialize the text payload
    fn read_text(&self) -> Result<String, DropDataError>;
}

/// Text of a UTF-16 payload up to its first NUL
#[cfg_attr(not(windows), allow(dead_code))]
pub(crate) fn text_from_wide(units: &[u16]) -> String {
    let len = units.iter().position(|&unit| unit == 0).unwrap_or(units.len());
    String::from_utf16_lossy(&units[..len])
}

/// Text of a narrow payload up to its first NUL; invalid sequences are replaced
#[cfg_attr(not(windows), allow(dead_code))]
pub(crate) fn text_from_narrow(bytes: &[u8]) -> String {
    let len = bytes.iter().position(|&byte| byte == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..len]).into_owned()
}

/// Format probes computed once when a drag session starts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormatProbe {
    /// Payload advertises a file list
    pub has_files: bool,
    /// Payload advertises text
    pub has_text: bool,
}

impl FormatProbe {
    /// Build probes from a list of formats
    pub fn from_formats(formats: impl IntoIterator<Item = DropFormat>) -> Self {
        formats.into_iter().fold(Self::default(), |mut probe, format| {
            match format {
                DropFormat::Files => probe.has_files = true,
                DropFormat::Text => probe.has_text = true,
                DropFormat::Image => {}
            }
            probe
        })
    }

    /// Enumerate a source's formats
    pub fn from_source(source: &dyn DataSource) -> Self {
        Self::from_formats(source.formats())
    }
}

/// Capability object handed to drop callbacks.
///
/// The probes are fixed for the whole drag session. The data source is only
/// borrowed for the duration of one callback, so a context cannot be kept.
pub struct DropContext<'a> {
    probe: FormatProbe,
    source: Option<&'a dyn DataSource>,
}

impl<'a> DropContext<'a> {
    /// Context with session probes and, when the OS supplied one, a data source
    pub fn new(probe: FormatProbe, source: Option<&'a dyn DataSource>) -> Self {
        Self { probe, source }
    }

    /// Payload carries a file list
    pub const fn has_files(&self) -> bool {
        self.probe.has_files
    }

    /// Payload carries text
    pub const fn has_text(&self) -> bool {
        self.probe.has_text
    }

    /// Session probes
    pub const fn probe(&self) -> FormatProbe {
        self.probe
    }

    /// Dropped file paths
    pub fn files(&self) -> Result<Vec<PathBuf>, DropDataError> {
        if !self.probe.has_files {
            return Err(DropDataError::FormatUnavailable(DropFormat::Files));
        }
        self.source()?.read_files()
    }

    /// Dropped text, one entry per non-empty line
    pub fn text(&self) -> Result<Vec<String>, DropDataError> {
        if !self.probe.has_text {
            return Err(DropDataError::FormatUnavailable(DropFormat::Text));
        }
        let raw = self.source()?.read_text()?;
        let lines: Vec<String> = raw
            .lines()
            .filter(|line| !line.is_empty())
            .map(str::to_owned)
            .collect();
        if lines.is_empty() {
            return Err(DropDataError::Empty);
        }
        Ok(lines)
    }

    fn source(&self) -> Result<&'a dyn DataSource, DropDataError> {
        self.source.ok_or(DropDataError::NoDataSource)
    }
}

impl std::fmt::Debug for DropContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DropContext")
            .field("probe", &self.probe)
            .field("has_source", &self.source.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dnd::OwnedDataSource;

    struct LockedSource;

    impl DataSource for LockedSource {
        fn formats(&self) -> Vec<DropFormat> {
            vec![DropFormat::Files, DropFormat::Text]
        }

        fn read_files(&self) -> Result<Vec<PathBuf>, DropDataError> {
            Err(DropDataError::LockFailed)
        }

        fn read_text(&self) -> Result<String, DropDataError> {
            Err(DropDataError::LockFailed)
        }
    }

    #[test]
    fn test_wide_text_stops_at_nul() {
        let mut units: Vec<u16> = "caf\u{e9}\r\n\u{1F600}".encode_utf16().collect();
        units.extend([0, 0x41, 0]);
        assert_eq!(text_from_wide(&units), "caf\u{e9}\r\n\u{1F600}");
        assert_eq!(text_from_wide(&[0x68, 0x69]), "hi");
        assert_eq!(text_from_wide(&[0, 0x68]), "");
    }

    #[test]
    fn test_narrow_text_stops_at_nul() {
        assert_eq!(text_from_narrow(b"first\r\nsecond\0garbage"), "first\r\nsecond");
        assert_eq!(text_from_narrow(b"no terminator"), "no terminator");
        assert_eq!(text_from_narrow(b"bad \xff byte\0"), "bad \u{fffd} byte");
        assert_eq!(text_from_narrow(b"\0"), "");
    }

    #[test]
    fn test_probe_from_formats() {
        let probe = FormatProbe::from_formats([DropFormat::Image, DropFormat::Text]);
        assert!(probe.has_text);
        assert!(!probe.has_files);
    }

    #[test]
    fn test_text_split_into_non_empty_lines() {
        let source = OwnedDataSource::new().with_text("first\r\n\r\nsecond\nthird\n");
        let context = DropContext::new(FormatProbe::from_source(&source), Some(&source));
        assert_eq!(
            context.text().unwrap(),
            vec!["first".to_string(), "second".to_string(), "third".to_string()]
        );
    }

    #[test]
    fn test_blank_text_is_empty_error() {
        let source = OwnedDataSource::new().with_text("\n\n");
        let context = DropContext::new(FormatProbe::from_source(&source), Some(&source));
        assert_eq!(context.text(), Err(DropDataError::Empty));
    }

    #[test]
    fn test_probe_short_circuits_missing_format() {
        let source = OwnedDataSource::new().with_text("hello");
        let context = DropContext::new(FormatProbe::from_source(&source), Some(&source));
        assert_eq!(
            context.files(),
            Err(DropDataError::FormatUnavailable(DropFormat::Files))
        );
    }

    #[test]
    fn test_materialization_fails_independently_of_probes() {
        let source = LockedSource;
        let context = DropContext::new(FormatProbe::from_source(&source), Some(&source));
        assert!(context.has_files());
        assert!(context.has_text());
        assert_eq!(context.files(), Err(DropDataError::LockFailed));
        assert_eq!(context.text(), Err(DropDataError::LockFailed));
    }

    #[test]
    fn test_missing_source() {
        let probe = FormatProbe {
            has_files: true,
            has_text: false,
        };
        let context = DropContext::new(probe, None);
        assert!(context.has_files());
        assert_eq!(context.files(), Err(DropDataError::NoDataSource));
    }
}
