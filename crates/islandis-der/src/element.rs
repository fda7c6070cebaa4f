#![forbid(unsafe_code)]

//! Tag/length/content parsing for a single element.

use islandis_core::DerError;

/// Universal tag numbers used by X.509 structures.
pub mod tag {
    pub const BOOLEAN: u32 = 0x01;
    pub const INTEGER: u32 = 0x02;
    pub const BIT_STRING: u32 = 0x03;
    pub const OCTET_STRING: u32 = 0x04;
    pub const NULL: u32 = 0x05;
    pub const OBJECT_IDENTIFIER: u32 = 0x06;
    pub const UTF8_STRING: u32 = 0x0C;
    pub const SEQUENCE: u32 = 0x10;
    pub const SET: u32 = 0x11;
    pub const PRINTABLE_STRING: u32 = 0x13;
    pub const T61_STRING: u32 = 0x14;
    pub const IA5_STRING: u32 = 0x16;
    pub const UTC_TIME: u32 = 0x17;
    pub const GENERALIZED_TIME: u32 = 0x18;
    pub const BMP_STRING: u32 = 0x1E;

    /// Human-readable name of a universal tag, for diagnostics.
    pub fn name(number: u32) -> Option<&'static str> {
        Some(match number {
            BOOLEAN => "BOOLEAN",
            INTEGER => "INTEGER",
            BIT_STRING => "BIT STRING",
            OCTET_STRING => "OCTET STRING",
            NULL => "NULL",
            OBJECT_IDENTIFIER => "OBJECT IDENTIFIER",
            UTF8_STRING => "UTF8String",
            SEQUENCE => "SEQUENCE",
            SET => "SET",
            PRINTABLE_STRING => "PrintableString",
            T61_STRING => "T61String",
            IA5_STRING => "IA5String",
            UTC_TIME => "UTCTime",
            GENERALIZED_TIME => "GeneralizedTime",
            BMP_STRING => "BMPString",
            _ => return None,
        })
    }
}

/// The two class bits of the identifier octet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Class {
    Universal,
    Application,
    ContextSpecific,
    Private,
}

impl Class {
    fn from_identifier(octet: u8) -> Self {
        match octet >> 6 {
            0 => Class::Universal,
            1 => Class::Application,
            2 => Class::ContextSpecific,
            _ => Class::Private,
        }
    }
}

/// One parsed element over a borrowed buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerElement<'a> {
    class: Class,
    constructed: bool,
    tag: u32,
    header_len: usize,
    raw: &'a [u8],
}

impl<'a> DerElement<'a> {
    /// Parse the element at the start of `input`, returning it together with
    /// the bytes that follow it.
    pub fn parse(input: &'a [u8]) -> Result<(Self, &'a [u8]), DerError> {
        let identifier = *input.first().ok_or(DerError::Truncated(0))?;
        let class = Class::from_identifier(identifier);
        let constructed = identifier & 0x20 != 0;

        let (tag, mut pos) = parse_tag_number(input, identifier)?;

        let first = *input.get(pos).ok_or(DerError::Truncated(pos))?;
        pos += 1;
        let content_len = match first {
            n if n & 0x80 == 0 => usize::from(n),
            0x80 => return Err(DerError::IndefiniteLength),
            0xFF => return Err(DerError::ReservedLength),
            n => {
                let count = usize::from(n & 0x7F);
                if count > 8 {
                    return Err(DerError::LengthOverflow(count));
                }
                let octets = input
                    .get(pos..pos + count)
                    .ok_or(DerError::Truncated(input.len()))?;
                let mut padded = [0u8; 8];
                padded[8 - count..].copy_from_slice(octets);
                pos += count;
                usize::try_from(u64::from_be_bytes(padded))
                    .map_err(|_| DerError::LengthOverflow(count))?
            }
        };

        let end = pos
            .checked_add(content_len)
            .filter(|end| *end <= input.len())
            .ok_or(DerError::Truncated(input.len()))?;

        let element = DerElement {
            class,
            constructed,
            tag,
            header_len: pos,
            raw: &input[..end],
        };
        Ok((element, &input[end..]))
    }

    /// Parse `input` as exactly one element.
    pub fn parse_exact(input: &'a [u8]) -> Result<Self, DerError> {
        let (element, rest) = Self::parse(input)?;
        if !rest.is_empty() {
            return Err(DerError::TrailingData(rest.len()));
        }
        Ok(element)
    }

    pub fn class(&self) -> Class {
        self.class
    }

    pub fn is_constructed(&self) -> bool {
        self.constructed
    }

    /// The tag number (without class and constructed bits).
    pub fn tag(&self) -> u32 {
        self.tag
    }

    pub fn header_len(&self) -> usize {
        self.header_len
    }

    /// The element's full serialized bytes: header and content.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.raw
    }

    /// The raw content octets, without any interpretation.
    pub fn content(&self) -> &'a [u8] {
        &self.raw[self.header_len..]
    }

    pub fn is_universal(&self, number: u32) -> bool {
        self.class == Class::Universal && self.tag == number
    }

    /// The content of a primitive element.
    ///
    /// A BIT STRING is unwrapped: its leading unused-bits octet is removed,
    /// and only the all-bits-used form is accepted.
    pub fn value(&self) -> Result<&'a [u8], DerError> {
        if self.constructed {
            return Err(DerError::UnexpectedTag {
                expected: "primitive element",
                found: self.tag,
            });
        }
        let content = self.content();
        if !self.is_universal(tag::BIT_STRING) {
            return Ok(content);
        }
        match content.split_first() {
            Some((0, bits)) => Ok(bits),
            Some((&unused, _)) => Err(DerError::PartialFinalOctet(unused)),
            None => Err(DerError::Truncated(self.header_len)),
        }
    }

    /// Decode the content of a constructed element into its children, in
    /// order. Each child's serialized length advances the cursor until the
    /// content is exhausted.
    pub fn children(&self) -> Result<Vec<DerElement<'a>>, DerError> {
        if !self.constructed {
            return Err(DerError::UnexpectedTag {
                expected: "constructed element",
                found: self.tag,
            });
        }
        let mut rest = self.content();
        let mut children = Vec::new();
        while !rest.is_empty() {
            let (child, tail) = DerElement::parse(rest)?;
            children.push(child);
            rest = tail;
        }
        Ok(children)
    }

    /// Like [`children`](Self::children), requiring an exact child count.
    pub fn children_exact(&self, count: usize) -> Result<Vec<DerElement<'a>>, DerError> {
        let children = self.children()?;
        if children.len() != count {
            return Err(DerError::ChildCount {
                expected: count,
                found: children.len(),
            });
        }
        Ok(children)
    }

    /// Fail unless this is the universal element `number`.
    pub fn expect(&self, number: u32, expected: &'static str) -> Result<&Self, DerError> {
        if self.is_universal(number) {
            Ok(self)
        } else {
            Err(DerError::UnexpectedTag {
                expected,
                found: self.tag,
            })
        }
    }

    /// Dotted-decimal text of an OBJECT IDENTIFIER element.
    pub fn oid(&self) -> Result<String, DerError> {
        self.expect(tag::OBJECT_IDENTIFIER, "OBJECT IDENTIFIER")?;
        crate::oid::decode_oid(self.value()?)
    }
}

/// Tag number from the identifier octet and, for the high-tag-number form,
/// the base-128 octets that follow it. Returns the number and the offset of
/// the first length octet.
fn parse_tag_number(input: &[u8], identifier: u8) -> Result<(u32, usize), DerError> {
    let low = identifier & 0x1F;
    if low != 0x1F {
        return Ok((u32::from(low), 1));
    }

    let mut number: u32 = 0;
    let mut pos = 1;
    loop {
        let octet = *input.get(pos).ok_or(DerError::Truncated(pos))?;
        if pos == 1 && octet == 0x80 {
            return Err(DerError::NonMinimalTag);
        }
        if number > u32::MAX >> 7 {
            return Err(DerError::TagOverflow);
        }
        number = (number << 7) | u32::from(octet & 0x7F);
        pos += 1;
        if octet & 0x80 == 0 {
            return Ok((number, pos));
        }
    }
}
