//! Bounds-checked little-endian readers over untrusted byte slices.
//!
//! Every read returns `None` instead of panicking when the requested
//! window does not fit in the buffer.

#[inline]
pub fn read_u8(buf: &[u8], offset: usize) -> Option<u8> {
    buf.get(offset).copied()
}

#[inline]
pub fn read_u16_le(buf: &[u8], offset: usize) -> Option<u16> {
    let end = offset.checked_add(2)?;
    buf.get(offset..end)?.try_into().ok().map(u16::from_le_bytes)
}

#[inline]
pub fn read_u32_le(buf: &[u8], offset: usize) -> Option<u32> {
    let end = offset.checked_add(4)?;
    buf.get(offset..end)?.try_into().ok().map(u32::from_le_bytes)
}

/// Everything from `offset` to the end, empty when `offset` is out of range.
#[inline]
pub fn tail(buf: &[u8], offset: usize) -> &[u8] {
    buf.get(offset..).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_stay_in_bounds() {
        let buf = [0x01, 0x02, 0x03, 0x04, 0x05];
        assert_eq!(read_u8(&buf, 4), Some(0x05));
        assert_eq!(read_u8(&buf, 5), None);
        assert_eq!(read_u16_le(&buf, 0), Some(0x0201));
        assert_eq!(read_u16_le(&buf, 4), None);
        assert_eq!(read_u32_le(&buf, 1), Some(0x0504_0302));
        assert_eq!(read_u32_le(&buf, 2), None);
        assert_eq!(read_u32_le(&buf, usize::MAX), None);
        assert_eq!(tail(&buf, 3), &[0x04, 0x05]);
        assert!(tail(&buf, 9).is_empty());
    }
}
