//! Soft synth byte stream decoder.
//!
//! The speakup soft synth writes plain text interleaved with a tiny escape
//! grammar:
//!
//! ```text
//! 0x01 ['+' | '-'] digit* selector     selector in {b, f, p, s, v}
//! 0x18                                 flush marker
//! any other byte < 0x20                unknown single-byte command
//! any byte >= 0x20                     text (includes high-bit bytes)
//! ```
//!
//! Decoding is a pure function of the buffer. The flush marker is handled by
//! the reader before decoding (see [`after_last_flush`]).

use std::collections::TryReserveError;

use tracing::{debug, error, trace};

use crate::entry::{Adjust, Parameter, QueueEntry};

/// Introduces a parameter command.
pub const COMMAND_INTRODUCER: u8 = 0x01;

/// Discard everything queued so far and stop speaking.
pub const FLUSH_MARKER: u8 = 0x18;

/// Longest text run placed in a single queue entry.
pub const MAX_TEXT_RUN: usize = 1024;

/// One decoded unit of the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    /// A run of printable bytes, at most [`MAX_TEXT_RUN`] long.
    Text(&'a [u8]),
    /// A well-formed parameter command.
    SetParam {
        parameter: Parameter,
        mode: Adjust,
        value: u32,
    },
    /// A control sequence that is consumed but has no meaning.
    Unknown(&'a [u8]),
    /// A command cut off by the end of the buffer. The bytes are dropped.
    NeedMoreInput(&'a [u8]),
}

fn is_text(byte: u8) -> bool {
    byte >= b' '
}

fn is_continuation(byte: u8) -> bool {
    byte & 0xC0 == 0x80
}

/// Iterator over the tokens of one buffer.
pub struct Tokenizer<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Offset of the next byte to be decoded.
    pub fn offset(&self) -> usize {
        self.pos
    }

    fn text_run(rest: &'a [u8]) -> Option<&'a [u8]> {
        let len = rest.iter().position(|&b| !is_text(b)).unwrap_or(rest.len());
        if len == 0 {
            return None;
        }
        if len <= MAX_TEXT_RUN {
            return Some(&rest[..len]);
        }

        // Keep multi-byte UTF-8 sequences in one piece when splitting.
        let mut cut = MAX_TEXT_RUN;
        while cut > MAX_TEXT_RUN - 3 && is_continuation(rest[cut]) {
            cut -= 1;
        }
        if is_continuation(rest[cut]) {
            cut = MAX_TEXT_RUN;
        }
        Some(&rest[..cut])
    }

    /// Decode the control sequence at the start of `rest`.
    /// Returns the token and the number of bytes it consumed (always >= 1).
    fn command(rest: &'a [u8]) -> (Token<'a>, usize) {
        if rest[0] != COMMAND_INTRODUCER {
            return (Token::Unknown(&rest[..1]), 1);
        }

        let mut i = 1;
        let mode = match rest.get(i) {
            Some(b'+') => {
                i += 1;
                Adjust::Increment
            }
            Some(b'-') => {
                i += 1;
                Adjust::Decrement
            }
            _ => Adjust::Set,
        };

        let mut value: u32 = 0;
        while let Some(digit) = rest.get(i).filter(|b| b.is_ascii_digit()) {
            value = value
                .saturating_mul(10)
                .saturating_add(u32::from(digit - b'0'));
            i += 1;
        }

        let Some(&selector) = rest.get(i) else {
            return (Token::NeedMoreInput(rest), rest.len());
        };
        i += 1;

        match Parameter::from_selector(selector) {
            Some(parameter) => (
                Token::SetParam {
                    parameter,
                    mode,
                    value,
                },
                i,
            ),
            None => (Token::Unknown(&rest[..i]), i),
        }
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        let buf = self.buf;
        let rest = buf.get(self.pos..).filter(|r| !r.is_empty())?;

        if let Some(run) = Self::text_run(rest) {
            self.pos += run.len();
            return Some(Token::Text(run));
        }

        let (token, used) = Self::command(rest);
        self.pos += used;
        Some(token)
    }
}

/// Return the bytes strictly after the last flush marker, or `None` when the
/// buffer holds no marker. Everything up to the last marker is superseded.
pub fn after_last_flush(buf: &[u8]) -> Option<&[u8]> {
    buf.iter()
        .rposition(|&b| b == FLUSH_MARKER)
        .map(|idx| &buf[idx + 1..])
}

/// Build the spoken string for a text run: UTF-8 when the run is valid UTF-8
/// (`/dev/softsynthu`), Latin-1 otherwise (`/dev/softsynth`).
pub fn text_from_bytes(run: &[u8]) -> Result<String, TryReserveError> {
    let mut text = String::new();
    match std::str::from_utf8(run) {
        Ok(s) => {
            text.try_reserve_exact(s.len())?;
            text.push_str(s);
        }
        Err(_) => {
            // Latin-1 code points above 0x7F take two bytes in UTF-8.
            text.try_reserve_exact(run.len() * 2)?;
            text.extend(run.iter().map(|&b| char::from(b)));
        }
    }
    Ok(text)
}

/// Decode `buf` and hand every resulting entry to `sink`, in stream order.
///
/// Unknown and truncated commands are dropped here. Text that cannot be
/// allocated is logged and dropped.
pub fn decode<F>(buf: &[u8], mut sink: F)
where
    F: FnMut(QueueEntry),
{
    for token in Tokenizer::new(buf) {
        match token {
            Token::Text(run) => match text_from_bytes(run) {
                Ok(text) => sink(QueueEntry::SpeakText {
                    text,
                    length: run.len(),
                }),
                Err(e) => error!("Unable to allocate space for text: {e}"),
            },
            Token::SetParam {
                parameter,
                mode,
                value,
            } => sink(QueueEntry::AdjustParameter {
                parameter,
                mode,
                value,
            }),
            Token::Unknown(raw) => trace!("Ignoring unknown command {raw:02x?}"),
            Token::NeedMoreInput(raw) => {
                debug!("Dropping truncated command at end of read: {raw:02x?}");
            }
        }
    }
}
