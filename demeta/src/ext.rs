use byteorder::{ByteOrder, LE};

/// Little-endian reads at fixed offsets of an in-memory buffer.
///
/// Callers check bounds up front; reads past the end panic.
pub(crate) trait SliceExt {
    fn u16_at(&self, offset: usize) -> u16;
    fn u32_at(&self, offset: usize) -> u32;
    fn u32s_at(&self, offset: usize, dst: &mut [u32]);
}

impl SliceExt for [u8] {
    fn u16_at(&self, offset: usize) -> u16 {
        LE::read_u16(&self[offset..offset + 2])
    }

    fn u32_at(&self, offset: usize) -> u32 {
        LE::read_u32(&self[offset..offset + 4])
    }

    fn u32s_at(&self, offset: usize, dst: &mut [u32]) {
        LE::read_u32_into(&self[offset..offset + 4 * dst.len()], dst)
    }
}

pub(crate) fn xor_in_place(dst: &mut [u8], src: &[u8]) {
    dst.iter_mut().zip(src).for_each(|(d, s)| *d ^= s);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads() {
        let data: Vec<u8> = (0..16).collect();
        assert_eq!(data.u16_at(1), 0x0201);
        assert_eq!(data.u32_at(4), 0x07060504);
        let mut words = [0; 2];
        data.u32s_at(8, &mut words);
        assert_eq!(words, [0x0B0A0908, 0x0F0E0D0C]);
    }

    #[test]
    fn test_xor_in_place() {
        let mut dst = [0xF0, 0x0F, 0xFF];
        xor_in_place(&mut dst, &[0xFF, 0xFF]);
        assert_eq!(dst, [0x0F, 0xF0, 0xFF]);
    }
}
