//! Harvard memory bus interface.

/// A word-wide bus with separate program and data spaces.
///
/// Addresses are host byte addresses: a processor word address multiplied
/// by two. Every access moves one 16-bit word. Implementations must not call
/// back into the processor that issued the access.
pub trait HarvardBus {
    /// Read a word from program space.
    fn read_program(&mut self, address: u32) -> u16;

    /// Write a word to program space.
    fn write_program(&mut self, address: u32, value: u16);

    /// Read a word from data space.
    fn read_data(&mut self, address: u32) -> u16;

    /// Write a word to data space.
    fn write_data(&mut self, address: u32, value: u16);
}

/// Flat 64K-word program and data memories with no memory map.
///
/// Byte addresses are halved and wrap at 64K words.
#[derive(Clone, PartialEq, Eq)]
pub struct WordMemory {
    program: Vec<u16>,
    data: Vec<u16>,
}

impl WordMemory {
    /// Words in each address space.
    pub const WORDS: usize = 0x1_0000;

    #[must_use]
    pub fn new() -> Self {
        Self {
            program: vec![0; Self::WORDS],
            data: vec![0; Self::WORDS],
        }
    }

    /// Copy words into program space starting at a word address.
    pub fn load_program(&mut self, word_address: u16, words: &[u16]) {
        Self::load(&mut self.program, word_address, words);
    }

    /// Copy words into data space starting at a word address.
    pub fn load_data(&mut self, word_address: u16, words: &[u16]) {
        Self::load(&mut self.data, word_address, words);
    }

    /// Peek a program word by word address.
    #[must_use]
    pub fn program(&self, word_address: u16) -> u16 {
        self.program[usize::from(word_address)]
    }

    /// Peek a data word by word address.
    #[must_use]
    pub fn data(&self, word_address: u16) -> u16 {
        self.data[usize::from(word_address)]
    }

    fn load(space: &mut [u16], word_address: u16, words: &[u16]) {
        for (offset, &word) in words.iter().enumerate() {
            space[(usize::from(word_address) + offset) & (Self::WORDS - 1)] = word;
        }
    }

    fn index(address: u32) -> usize {
        (address >> 1) as usize & (Self::WORDS - 1)
    }
}

impl Default for WordMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for WordMemory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WordMemory")
            .field("words", &Self::WORDS)
            .finish_non_exhaustive()
    }
}

impl HarvardBus for WordMemory {
    fn read_program(&mut self, address: u32) -> u16 {
        self.program[Self::index(address)]
    }

    fn write_program(&mut self, address: u32, value: u16) {
        self.program[Self::index(address)] = value;
    }

    fn read_data(&mut self, address: u32) -> u16 {
        self.data[Self::index(address)]
    }

    fn write_data(&mut self, address: u32, value: u16) {
        self.data[Self::index(address)] = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_addresses_select_words() {
        let mut mem = WordMemory::new();
        mem.write_data(0x0010, 0xBEEF);
        assert_eq!(mem.data(0x0008), 0xBEEF);
        assert_eq!(mem.read_data(0x0011), 0xBEEF);
        assert_eq!(mem.read_program(0x0010), 0);
    }

    #[test]
    fn loads_wrap_at_top_of_space() {
        let mut mem = WordMemory::new();
        mem.load_program(0xFFFF, &[0x1111, 0x2222]);
        assert_eq!(mem.program(0xFFFF), 0x1111);
        assert_eq!(mem.program(0x0000), 0x2222);
    }
}
