//! Shared fixtures for binfmt tests

use alloc::{sync::Arc, vec::Vec};

use super::config::{RegistryConfig, WasmBinfmtConfig};
use super::elf::ElfBinfmt;
use super::registry::FormatRegistry;
use super::request::{ArgVector, ExecRequest};
use super::wasm::WasmBinfmt;
use crate::environment::DEFAULT_ARG_BUDGET;
use crate::fs::{open_exec, tmpfs::TmpFS, FilePermission};

pub const LAUNCHER: &str = "/usr/libexec/wasm-launcher";
pub const ENTRY_POINT: u64 = 0x1_0000;
pub const EM_RISCV: u16 = 0xF3;

/// Minimal little-endian ELF64 executable header followed by padding
pub fn elf64_image(entry: u64) -> Vec<u8> {
    let mut image = alloc::vec![0u8; 128];
    image[..4].copy_from_slice(&[0x7F, b'E', b'L', b'F']);
    image[4] = 2; // ELFCLASS64
    image[5] = 1; // ELFDATA2LSB
    image[6] = 1; // EV_CURRENT
    image[16..18].copy_from_slice(&2u16.to_le_bytes()); // ET_EXEC
    image[18..20].copy_from_slice(&EM_RISCV.to_le_bytes());
    image[20..24].copy_from_slice(&1u32.to_le_bytes());
    image[24..32].copy_from_slice(&entry.to_le_bytes());
    image[32..40].copy_from_slice(&64u64.to_le_bytes()); // e_phoff
    image[52..54].copy_from_slice(&64u16.to_le_bytes()); // e_ehsize
    image[54..56].copy_from_slice(&56u16.to_le_bytes()); // e_phentsize
    image
}

pub fn wasm_module() -> Vec<u8> {
    alloc::vec![0x00, 0x61, 0x73, 0x6D, 0x01, 0x00, 0x00, 0x00]
}

/// TmpFS holding an executable ELF launcher at [`LAUNCHER`]
pub fn launcher_fs() -> Arc<TmpFS> {
    let fs = TmpFS::new();
    fs.create_file(LAUNCHER, &elf64_image(ENTRY_POINT), FilePermission::EXECUTABLE)
        .unwrap();
    fs
}

/// Open `path` on `fs` and wrap it into a fresh request
pub fn request_for(fs: &Arc<TmpFS>, path: &str, argv: &[&str]) -> ExecRequest {
    let file = open_exec(fs.as_ref(), path).unwrap();
    let argv = ArgVector::from_strs(argv, DEFAULT_ARG_BUDGET).unwrap();
    ExecRequest::new(fs.clone(), file, path, argv, ArgVector::new()).unwrap()
}

pub fn wasm_binfmt() -> WasmBinfmt {
    WasmBinfmt::new(WasmBinfmtConfig::default())
}

/// Registry with the ELF and WebAssembly formats, in that order
pub fn default_registry(max_interp_depth: usize) -> Arc<FormatRegistry> {
    let registry = Arc::new(FormatRegistry::new(RegistryConfig { max_interp_depth }));
    registry.register(Arc::new(ElfBinfmt)).unwrap();
    registry.register(Arc::new(wasm_binfmt())).unwrap();
    registry
}
