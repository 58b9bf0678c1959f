//! Byte, word, dword and qword access. Little-endian accessors put the least
//! significant byte at the lower index (SATA data), big-endian ones the most
//! significant byte (SCSI data).

use crate::error::{Error, Result};

use super::Buffer;

fn check_bit(bit: u8, width: u8, unit: &str) -> Result<()> {
    if bit >= width {
        return Err(Error::invalid_argument(format!(
            "Invalid bit index. {} is beyond the width of a {}.",
            bit, unit
        )));
    }
    Ok(())
}

fn bit_of(value: u64, bit: u8) -> u8 {
    ((value >> bit) & 1) as u8
}

impl Buffer {
    fn read<const N: usize>(&self, index: usize) -> Result<[u8; N]> {
        let range = self.validate_span(index, N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(&self.as_slice()[range]);
        Ok(out)
    }

    fn write<const N: usize>(&mut self, index: usize, bytes: [u8; N]) -> Result<&mut Self> {
        let range = self.validate_span(index, N)?;
        self.as_mut_slice()[range].copy_from_slice(&bytes);
        Ok(self)
    }

    pub fn get_byte(&self, index: usize) -> Result<u8> {
        self.validate_index(index)?;
        Ok(self.as_slice()[index])
    }

    pub fn get_byte_bit(&self, index: usize, bit: u8) -> Result<u8> {
        check_bit(bit, 8, "byte")?;
        Ok(bit_of(self.get_byte(index)? as u64, bit))
    }

    pub fn set_byte(&mut self, index: usize, value: u8) -> Result<&mut Self> {
        self.validate_index(index)?;
        self.as_mut_slice()[index] = value;
        Ok(self)
    }

    pub fn get_word(&self, index: usize) -> Result<u16> {
        Ok(u16::from_le_bytes(self.read(index)?))
    }

    pub fn get_word_bit(&self, index: usize, bit: u8) -> Result<u8> {
        check_bit(bit, 16, "word")?;
        Ok(bit_of(self.get_word(index)? as u64, bit))
    }

    pub fn set_word(&mut self, index: usize, value: u16) -> Result<&mut Self> {
        self.write(index, value.to_le_bytes())
    }

    pub fn get_word_big_endian(&self, index: usize) -> Result<u16> {
        Ok(u16::from_be_bytes(self.read(index)?))
    }

    pub fn get_word_bit_big_endian(&self, index: usize, bit: u8) -> Result<u8> {
        check_bit(bit, 16, "word")?;
        Ok(bit_of(self.get_word_big_endian(index)? as u64, bit))
    }

    pub fn set_word_big_endian(&mut self, index: usize, value: u16) -> Result<&mut Self> {
        self.write(index, value.to_be_bytes())
    }

    pub fn get_dword(&self, index: usize) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read(index)?))
    }

    pub fn get_dword_bit(&self, index: usize, bit: u8) -> Result<u8> {
        check_bit(bit, 32, "dword")?;
        Ok(bit_of(self.get_dword(index)? as u64, bit))
    }

    pub fn set_dword(&mut self, index: usize, value: u32) -> Result<&mut Self> {
        self.write(index, value.to_le_bytes())
    }

    pub fn get_dword_big_endian(&self, index: usize) -> Result<u32> {
        Ok(u32::from_be_bytes(self.read(index)?))
    }

    pub fn get_dword_bit_big_endian(&self, index: usize, bit: u8) -> Result<u8> {
        check_bit(bit, 32, "dword")?;
        Ok(bit_of(self.get_dword_big_endian(index)? as u64, bit))
    }

    pub fn set_dword_big_endian(&mut self, index: usize, value: u32) -> Result<&mut Self> {
        self.write(index, value.to_be_bytes())
    }

    pub fn get_qword(&self, index: usize) -> Result<u64> {
        Ok(u64::from_le_bytes(self.read(index)?))
    }

    pub fn get_qword_bit(&self, index: usize, bit: u8) -> Result<u8> {
        check_bit(bit, 64, "qword")?;
        Ok(bit_of(self.get_qword(index)?, bit))
    }

    pub fn set_qword(&mut self, index: usize, value: u64) -> Result<&mut Self> {
        self.write(index, value.to_le_bytes())
    }

    pub fn get_qword_big_endian(&self, index: usize) -> Result<u64> {
        Ok(u64::from_be_bytes(self.read(index)?))
    }

    pub fn get_qword_bit_big_endian(&self, index: usize, bit: u8) -> Result<u8> {
        check_bit(bit, 64, "qword")?;
        Ok(bit_of(self.get_qword_big_endian(index)?, bit))
    }

    pub fn set_qword_big_endian(&mut self, index: usize, value: u64) -> Result<&mut Self> {
        self.write(index, value.to_be_bytes())
    }
}
