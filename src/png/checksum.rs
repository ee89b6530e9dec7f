//! CRC32 (chunk trailers) and Adler-32 (zlib trailer)

/// Reflected CRC-32 polynomial used by PNG and zlib
const POLYNOMIAL: u32 = 0xEDB8_8320;

static CRC_TABLE: [u32; 256] = build_crc_table();

const fn build_crc_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u32;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 1 != 0 { POLYNOMIAL ^ (crc >> 1) } else { crc >> 1 };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

/// Incremental CRC32, so a chunk's type and payload can be fed separately.
#[derive(Debug, Clone)]
pub struct Crc32 {
    state: u32,
}

impl Crc32 {
    pub fn new() -> Self {
        Self { state: 0xFFFF_FFFF }
    }

    pub fn update(&mut self, buf: &[u8]) {
        let mut crc = self.state;
        for &byte in buf {
            crc = CRC_TABLE[((crc as u8) ^ byte) as usize] ^ (crc >> 8);
        }
        self.state = crc;
    }

    pub fn finalize(&self) -> u32 {
        !self.state
    }
}

impl Default for Crc32 {
    fn default() -> Self {
        Self::new()
    }
}

/// CRC32 of a whole buffer
pub fn crc32(buf: &[u8]) -> u32 {
    let mut h = Crc32::new();
    h.update(buf);
    h.finalize()
}

/// Adler-32 of a whole buffer, `(b << 16) | a`
pub fn adler32(buf: &[u8]) -> u32 {
    adler::adler32_slice(buf)
}
