//! Streaming attribute lookup over DICOM files.
//!
//! Only element headers are decoded on the way to the requested attribute:
//! values are skipped with seeks and the scan stops as soon as it passes the
//! requested tag, so pixel data is never read. Deflated datasets are the
//! exception and are inflated in memory first.

use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::Path;

use encoding_rs::Encoding as TextEncoding;
use flate2::read::DeflateDecoder;

use crate::charset::{decode_text, encoding_for};
use crate::error::ParseError;
use crate::tag::Tag;

const PREAMBLE_LEN: usize = 128;
const MAGIC: &[u8; 4] = b"DICM";
const UNDEFINED_LENGTH: u32 = 0xFFFF_FFFF;
const MAX_NESTING: usize = 64;

pub const IMPLICIT_VR_LITTLE_ENDIAN: &str = "1.2.840.10008.1.2";
pub const EXPLICIT_VR_LITTLE_ENDIAN: &str = "1.2.840.10008.1.2.1";
pub const EXPLICIT_VR_BIG_ENDIAN: &str = "1.2.840.10008.1.2.2";
pub const DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN: &str = "1.2.840.10008.1.2.1.99";
/// GE private syntax; the dataset header is implicit little endian.
pub const GE_PRIVATE_IMPLICIT_VR_BIG_ENDIAN: &str = "1.2.840.113619.5.2";

const VALUE_REPRESENTATIONS: &[&[u8; 2]] = &[
    b"AE", b"AS", b"AT", b"CS", b"DA", b"DS", b"DT", b"FL", b"FD", b"IS", b"LO", b"LT", b"OB",
    b"OD", b"OF", b"OL", b"OV", b"OW", b"PN", b"SH", b"SL", b"SQ", b"SS", b"ST", b"SV", b"TM",
    b"UC", b"UI", b"UL", b"UN", b"UR", b"US", b"UT", b"UV",
];

/// Source of a single metadata attribute for a file.
pub trait MetadataReader {
    /// Read one textual attribute from the file at `path`.
    fn read_field(&self, path: &Path, tag: Tag) -> Result<String, ParseError>;
}

impl<M: MetadataReader + ?Sized> MetadataReader for &M {
    fn read_field(&self, path: &Path, tag: Tag) -> Result<String, ParseError> {
        (**self).read_field(path, tag)
    }
}

/// Byte layout of a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    ImplicitLittle,
    ExplicitLittle,
    ExplicitBig,
}

impl Encoding {
    /// Map a transfer syntax UID to the encoding of its dataset header.
    ///
    /// Every standard syntax other than the implicit and big-endian ones
    /// keeps an explicit little-endian header, the inflated content of a
    /// deflated dataset included.
    pub fn from_transfer_syntax(uid: &str) -> Result<Self, ParseError> {
        match uid {
            IMPLICIT_VR_LITTLE_ENDIAN | GE_PRIVATE_IMPLICIT_VR_BIG_ENDIAN => Ok(Self::ImplicitLittle),
            EXPLICIT_VR_BIG_ENDIAN => Ok(Self::ExplicitBig),
            _ if uid.starts_with("1.2.840.10008.1.2.") => Ok(Self::ExplicitLittle),
            _ => Err(ParseError::UnsupportedTransferSyntax(uid.to_string())),
        }
    }

    fn explicit_vr(self) -> bool {
        !matches!(self, Self::ImplicitLittle)
    }

    fn little_endian(self) -> bool {
        !matches!(self, Self::ExplicitBig)
    }
}

/// Reads attributes from DICOM Part 10 files and raw datasets.
#[derive(Debug, Clone, Copy, Default)]
pub struct DicomReader;

impl DicomReader {
    /// Create a new reader.
    pub fn new() -> Self {
        Self
    }

    /// Read one attribute from any seekable byte source.
    pub fn read_from<R: Read + Seek>(&self, mut source: R, tag: Tag) -> Result<String, ParseError> {
        let mut head = [0u8; PREAMBLE_LEN + 4];
        let read = read_fully(&mut source, &mut head)?;
        let has_preamble = read == head.len() && &head[PREAMBLE_LEN..] == MAGIC;
        let start = if has_preamble { head.len() as u64 } else { 0 };
        source.seek(SeekFrom::Start(start))?;

        let mut stream = ElementStream::new(source, Encoding::ExplicitLittle);
        let mut transfer_syntax = None;

        // File meta information is always explicit little endian.
        while stream.peek_group()? == Some(0x0002) {
            let header = stream.require_header()?;
            if header.tag == tag {
                return stream.read_string(&header);
            }
            if header.tag == Tag::TRANSFER_SYNTAX_UID {
                transfer_syntax = Some(stream.read_string(&header)?);
            } else {
                stream.skip_value(&header, 0)?;
            }
        }
        if tag.group == 0x0002 {
            return Err(ParseError::TagAbsent(tag));
        }

        let encoding = match transfer_syntax.as_deref() {
            Some(uid) => Encoding::from_transfer_syntax(uid)?,
            None => stream.sniff_encoding(has_preamble)?,
        };

        if transfer_syntax.as_deref() == Some(DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN) {
            let mut inflated = Vec::new();
            DeflateDecoder::new(stream.inner)
                .read_to_end(&mut inflated)
                .map_err(|e| {
                    ParseError::malformed(
                        Tag::TRANSFER_SYNTAX_UID,
                        format!("cannot inflate dataset: {e}"),
                    )
                })?;
            return ElementStream::new(Cursor::new(inflated), encoding).find(tag);
        }

        stream.encoding = encoding;
        stream.find(tag)
    }
}

impl MetadataReader for DicomReader {
    fn read_field(&self, path: &Path, tag: Tag) -> Result<String, ParseError> {
        tracing::trace!(path = %path.display(), %tag, "reading attribute");
        let file = File::open(path)?;
        self.read_from(BufReader::new(file), tag)
    }
}

#[derive(Debug)]
struct Header {
    tag: Tag,
    vr: Option<[u8; 2]>,
    length: u32,
}

impl Header {
    fn is_undefined_length(&self) -> bool {
        self.length == UNDEFINED_LENGTH
    }
}

struct ElementStream<R> {
    inner: R,
    encoding: Encoding,
    /// Set once (0008,0005) has been passed.
    charset: Option<&'static TextEncoding>,
}

impl<R: Read + Seek> ElementStream<R> {
    fn new(inner: R, encoding: Encoding) -> Self {
        Self {
            inner,
            encoding,
            charset: None,
        }
    }

    fn decode_u16(&self, bytes: [u8; 2]) -> u16 {
        if self.encoding.little_endian() {
            u16::from_le_bytes(bytes)
        } else {
            u16::from_be_bytes(bytes)
        }
    }

    fn u16(&mut self) -> Result<u16, ParseError> {
        let mut bytes = [0u8; 2];
        self.inner.read_exact(&mut bytes)?;
        Ok(self.decode_u16(bytes))
    }

    fn u32(&mut self) -> Result<u32, ParseError> {
        let mut bytes = [0u8; 4];
        self.inner.read_exact(&mut bytes)?;
        Ok(if self.encoding.little_endian() {
            u32::from_le_bytes(bytes)
        } else {
            u32::from_be_bytes(bytes)
        })
    }

    fn skip(&mut self, length: u32) -> Result<(), ParseError> {
        self.inner.seek(SeekFrom::Current(i64::from(length)))?;
        Ok(())
    }

    /// Group number of the next element without consuming it.
    fn peek_group(&mut self) -> Result<Option<u16>, ParseError> {
        let mut bytes = [0u8; 2];
        match read_fully(&mut self.inner, &mut bytes)? {
            0 => Ok(None),
            2 => {
                self.inner.seek(SeekFrom::Current(-2))?;
                Ok(Some(self.decode_u16(bytes)))
            }
            _ => Err(ParseError::Truncated),
        }
    }

    /// Next element header, or `None` at a clean end of data.
    fn next_header(&mut self) -> Result<Option<Header>, ParseError> {
        let mut group = [0u8; 2];
        match read_fully(&mut self.inner, &mut group)? {
            0 => return Ok(None),
            2 => {}
            _ => return Err(ParseError::Truncated),
        }
        let group = self.decode_u16(group);
        let element = self.u16()?;
        let tag = Tag::new(group, element);

        if tag.is_delimiter_group() {
            let length = self.u32()?;
            return Ok(Some(Header {
                tag,
                vr: None,
                length,
            }));
        }

        if !self.encoding.explicit_vr() {
            let length = self.u32()?;
            return Ok(Some(Header {
                tag,
                vr: None,
                length,
            }));
        }

        let mut vr = [0u8; 2];
        self.inner.read_exact(&mut vr)?;
        if !is_known_vr(&vr) {
            return Err(ParseError::malformed(
                tag,
                format!("invalid value representation {:02X}{:02X}", vr[0], vr[1]),
            ));
        }
        let length = if has_long_length(&vr) {
            let mut reserved = [0u8; 2];
            self.inner.read_exact(&mut reserved)?;
            self.u32()?
        } else {
            u32::from(self.u16()?)
        };
        Ok(Some(Header {
            tag,
            vr: Some(vr),
            length,
        }))
    }

    fn require_header(&mut self) -> Result<Header, ParseError> {
        self.next_header()?.ok_or(ParseError::Truncated)
    }

    fn read_string(&mut self, header: &Header) -> Result<String, ParseError> {
        if header.is_undefined_length() || header.vr == Some(*b"SQ") {
            return Err(ParseError::malformed(header.tag, "attribute is a sequence"));
        }
        let mut bytes = Vec::new();
        (&mut self.inner)
            .take(u64::from(header.length))
            .read_to_end(&mut bytes)?;
        if bytes.len() < header.length as usize {
            return Err(ParseError::Truncated);
        }
        let charset = if is_text_vr(header.vr) { self.charset } else { None };
        Ok(decode_text(&bytes, charset))
    }

    fn skip_value(&mut self, header: &Header, depth: usize) -> Result<(), ParseError> {
        if !header.is_undefined_length() {
            return self.skip(header.length);
        }
        if depth >= MAX_NESTING {
            return Err(ParseError::malformed(header.tag, "sequences nested too deeply"));
        }

        // UN with undefined length holds implicit little endian content.
        let saved = self.encoding;
        if header.vr == Some(*b"UN") {
            self.encoding = Encoding::ImplicitLittle;
        }
        let result = self.skip_sequence(depth + 1);
        self.encoding = saved;
        result
    }

    fn skip_sequence(&mut self, depth: usize) -> Result<(), ParseError> {
        loop {
            let header = self.require_header()?;
            match header.tag {
                Tag::SEQUENCE_DELIMITATION => return Ok(()),
                Tag::ITEM if header.is_undefined_length() => self.skip_item(depth)?,
                Tag::ITEM => self.skip(header.length)?,
                other => {
                    return Err(ParseError::malformed(other, "expected an item inside a sequence"));
                }
            }
        }
    }

    fn skip_item(&mut self, depth: usize) -> Result<(), ParseError> {
        loop {
            let header = self.require_header()?;
            if header.tag == Tag::ITEM_DELIMITATION {
                return Ok(());
            }
            self.skip_value(&header, depth)?;
        }
    }

    /// Guess the encoding of a dataset that has no transfer syntax.
    fn sniff_encoding(&mut self, has_preamble: bool) -> Result<Encoding, ParseError> {
        let mut bytes = [0u8; 8];
        let read = read_fully(&mut self.inner, &mut bytes)?;
        self.inner.seek(SeekFrom::Current(-(read as i64)))?;
        if read < bytes.len() {
            return Err(ParseError::NotDicom("dataset is empty or too short".to_string()));
        }

        let group_le = u16::from_le_bytes([bytes[0], bytes[1]]);
        let group_be = u16::from_be_bytes([bytes[0], bytes[1]]);
        let vr = [bytes[4], bytes[5]];

        if is_known_vr(&vr) {
            if is_leading_group(group_le) {
                return Ok(Encoding::ExplicitLittle);
            }
            if is_leading_group(group_be) {
                return Ok(Encoding::ExplicitBig);
            }
        } else if is_leading_group(group_le) {
            return Ok(Encoding::ImplicitLittle);
        }

        let reason = if has_preamble {
            "no recognisable dataset after the DICM prefix"
        } else {
            "missing DICM prefix and no recognisable dataset header"
        };
        Err(ParseError::NotDicom(reason.to_string()))
    }

    /// Scan forward to `tag` and decode it as text.
    fn find(&mut self, tag: Tag) -> Result<String, ParseError> {
        loop {
            let Some(header) = self.next_header()? else {
                return Err(ParseError::TagAbsent(tag));
            };
            if header.tag == tag {
                return self.read_string(&header);
            }
            if header.tag > tag {
                return Err(ParseError::TagAbsent(tag));
            }
            if header.tag == Tag::SPECIFIC_CHARACTER_SET {
                let terms = self.read_string(&header)?;
                tracing::trace!(%terms, "specific character set");
                self.charset = encoding_for(&terms);
                continue;
            }
            self.skip_value(&header, 0)?;
        }
    }
}

/// Fill `buf` as far as the source allows; returns the byte count.
fn read_fully<R: Read>(source: &mut R, buf: &mut [u8]) -> Result<usize, ParseError> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}

fn is_known_vr(vr: &[u8; 2]) -> bool {
    VALUE_REPRESENTATIONS.iter().any(|known| *known == vr)
}

fn has_long_length(vr: &[u8; 2]) -> bool {
    matches!(
        vr,
        b"OB" | b"OD" | b"OF" | b"OL" | b"OV" | b"OW" | b"SQ" | b"SV" | b"UC" | b"UN" | b"UR"
            | b"UT" | b"UV"
    )
}

/// Groups a raw dataset may plausibly start with.
fn is_leading_group(group: u16) -> bool {
    (0x0002..=0x0010).contains(&group)
}

/// Value representations decoded with the Specific Character Set; without
/// an explicit VR every value is.
fn is_text_vr(vr: Option<[u8; 2]>) -> bool {
    match vr {
        None => true,
        Some(vr) => matches!(&vr, b"SH" | b"LO" | b"ST" | b"PN" | b"LT" | b"UC" | b"UT"),
    }
}
