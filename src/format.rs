//! Pure text formatting for the address, hexadecimal and character columns.
//!
//! Every fragment carries its own row separator, so appending fragments in
//! stream order to three independent buffers keeps the columns line-aligned.

/// Number of bytes per rendered row.
pub const ROW_WIDTH: usize = 16;

/// Text produced for one (full or final) row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowText {
    pub address: String,
    pub hex: String,
    pub ascii: String,
}

/// Text produced for a single byte of a partial row.
///
/// `address` is only present when the byte starts a new row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ByteText {
    pub address: Option<String>,
    pub hex: String,
    pub ascii: String,
}

/// Returns true when `offset` is the first byte of a row.
#[inline]
pub fn is_row_start(offset: u64) -> bool {
    offset % ROW_WIDTH as u64 == 0
}

/// Rounds `offset` down to the start of its row.
#[inline]
pub fn row_start(offset: u64) -> u64 {
    offset - offset % ROW_WIDTH as u64
}

/// Maps a byte to its character-column representation.
///
/// Printable 7-bit ASCII (space through `~`) is shown as-is, everything else as `.`.
#[inline]
pub fn printable(byte: u8) -> char {
    if (0x20..=0x7e).contains(&byte) {
        byte as char
    } else {
        '.'
    }
}

/// Formats the address fragment of the row starting at `offset`.
///
/// The address is zero-padded to 8 digits. Offsets at or beyond 4 GiB keep
/// all of their digits and therefore widen the address column; rows stay
/// aligned, only the column width changes.
pub fn format_address(offset: u64, uppercase: bool) -> String {
    let sep = if offset == 0 { "" } else { "\n" };
    if uppercase {
        format!("{sep}{offset:08X}")
    } else {
        format!("{sep}{offset:08x}")
    }
}

fn push_hex_pair(out: &mut String, byte: u8, uppercase: bool) {
    let pair = if uppercase {
        hex::encode_upper([byte])
    } else {
        hex::encode([byte])
    };
    out.push_str(&pair);
}

/// Formats a row of at most [`ROW_WIDTH`] bytes starting at an aligned `offset`.
pub fn format_row(offset: u64, bytes: &[u8], uppercase: bool) -> RowText {
    debug_assert!(bytes.len() <= ROW_WIDTH);
    debug_assert!(is_row_start(offset));

    let address = format_address(offset, uppercase);

    let encoded = if uppercase {
        hex::encode_upper(bytes)
    } else {
        hex::encode(bytes)
    };
    let mut hex = String::with_capacity(1 + bytes.len() * 3);
    if offset != 0 {
        hex.push('\n');
    }
    for (i, pair) in encoded.as_bytes().chunks(2).enumerate() {
        if i > 0 {
            hex.push(' ');
        }
        hex.extend(pair.iter().map(|&c| c as char));
    }

    let mut ascii = String::with_capacity(1 + bytes.len());
    if offset != 0 {
        ascii.push('\n');
    }
    ascii.extend(bytes.iter().copied().map(printable));

    RowText {
        address,
        hex,
        ascii,
    }
}

/// Formats one byte of a leading or trailing partial row.
///
/// When `is_row_start` is set the byte opens a new row: the fragment carries
/// the address and the row separators. Otherwise the hex pair is prefixed
/// with the in-row space separator.
pub fn format_unaligned_byte(offset: u64, byte: u8, uppercase: bool, is_row_start: bool) -> ByteText {
    let mut hex = String::with_capacity(3);
    let mut ascii = String::with_capacity(2);
    let address = if is_row_start {
        if offset != 0 {
            hex.push('\n');
            ascii.push('\n');
        }
        Some(format_address(offset, uppercase))
    } else {
        hex.push(' ');
        None
    };
    push_hex_pair(&mut hex, byte, uppercase);
    ascii.push(printable(byte));

    ByteText {
        address,
        hex,
        ascii,
    }
}
