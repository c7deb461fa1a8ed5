//! Native ELF format
//!
//! Recognizes ELF64 executables from the buffered prefix and commits the
//! request. Only the file header is examined; mapping the program headers
//! belongs to whoever consumes the committed request.

use super::{BinaryFormat, ExecError, ExecRequest, LoadOutcome, LoadedImage};

// ELF Magic Number
const ELFMAG: [u8; 4] = [0x7F, b'E', b'L', b'F'];
// ELF Class
const ELFCLASS64: u8 = 2; // 64-bit
// ELF Data Endian
const ELFDATA2LSB: u8 = 1; // Little Endian
const ELFDATA2MSB: u8 = 2; // Big Endian

// ELF Identifier Indices
const EI_CLASS: usize = 4;
const EI_DATA: usize = 5;

// Object file types
const ET_EXEC: u16 = 2;
const ET_DYN: u16 = 3;

const ELF64_EHDR_SIZE: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElfHeader {
    pub ei_class: u8,      // 32-bit or 64-bit (EI_CLASS)
    pub ei_data: u8,       // Endianness (EI_DATA)
    pub e_type: u16,       // File type
    pub e_machine: u16,    // Machine type
    pub e_version: u32,    // ELF version
    pub e_entry: u64,      // Entry point address
    pub e_phoff: u64,      // Program header table file offset
    pub e_phentsize: u16,  // Program header table entry size
    pub e_phnum: u16,      // Number of program header entries
}

struct Reader<'a> {
    buffer: &'a [u8],
    little_endian: bool,
}

impl Reader<'_> {
    fn bytes<const N: usize>(&self, offset: usize) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.buffer[offset..offset + N]);
        if !self.little_endian {
            out.reverse();
        }
        out
    }

    fn u16(&self, offset: usize) -> u16 {
        u16::from_le_bytes(self.bytes(offset))
    }

    fn u32(&self, offset: usize) -> u32 {
        u32::from_le_bytes(self.bytes(offset))
    }

    fn u64(&self, offset: usize) -> u64 {
        u64::from_le_bytes(self.bytes(offset))
    }
}

impl ElfHeader {
    pub fn is_elf(buffer: &[u8]) -> bool {
        buffer.starts_with(&ELFMAG)
    }

    pub fn parse(buffer: &[u8]) -> Result<Self, ExecError> {
        if !Self::is_elf(buffer) {
            return Err(ExecError::InvalidImage("Invalid ELF magic number"));
        }
        if buffer.len() < ELF64_EHDR_SIZE {
            return Err(ExecError::InvalidImage("ELF header too small"));
        }

        let ei_class = buffer[EI_CLASS];
        let ei_data = buffer[EI_DATA];

        // Only 64-bit ELF is supported
        if ei_class != ELFCLASS64 {
            return Err(ExecError::InvalidImage("Only 64-bit ELF is supported"));
        }
        if ei_data != ELFDATA2LSB && ei_data != ELFDATA2MSB {
            return Err(ExecError::InvalidImage("Unknown ELF data encoding"));
        }

        let reader = Reader { buffer, little_endian: ei_data == ELFDATA2LSB };
        let header = Self {
            ei_class,
            ei_data,
            e_type: reader.u16(16),
            e_machine: reader.u16(18),
            e_version: reader.u32(20),
            e_entry: reader.u64(24),
            e_phoff: reader.u64(32),
            e_phentsize: reader.u16(54),
            e_phnum: reader.u16(56),
        };
        if header.e_type != ET_EXEC && header.e_type != ET_DYN {
            return Err(ExecError::InvalidImage("ELF file is not executable"));
        }
        Ok(header)
    }
}

/// The native executable format
#[derive(Debug, Default, Clone, Copy)]
pub struct ElfBinfmt;

impl BinaryFormat for ElfBinfmt {
    fn name(&self) -> &'static str {
        "elf"
    }

    fn load_binary(&self, request: &mut ExecRequest) -> Result<LoadOutcome, ExecError> {
        if !ElfHeader::is_elf(request.prefix()) {
            return Ok(LoadOutcome::NotRecognized);
        }
        let header = ElfHeader::parse(request.prefix())?;
        log::debug!(
            "elf: {} machine={:#x} entry={:#x}",
            request.interp(),
            header.e_machine,
            header.e_entry
        );
        Ok(LoadOutcome::Commit(LoadedImage {
            format: self.name(),
            entry_point: header.e_entry,
            machine: header.e_machine,
            class: header.ei_class,
        }))
    }
}
