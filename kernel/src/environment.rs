pub const PAGE_SIZE: usize = 0x1000; // 4KB
pub const PATH_MAX: usize = 4096;

/// Bytes of the candidate file buffered into the request before any recognizer runs
pub const BINPRM_BUF_SIZE: usize = 256;

pub const WASM_MAGIC: [u8; WASM_MAGIC_LEN] = [0x00, 0x61, 0x73, 0x6D]; // \0asm
pub const WASM_MAGIC_LEN: usize = 4;
pub const DEFAULT_LAUNCHER_PATH: &str = "/usr/libexec/wasm-launcher";

/// Redispatch ceiling used when no other value is configured
pub const DEFAULT_MAX_INTERP_DEPTH: usize = 5;

pub const MAX_ARG_STRLEN: usize = 32 * PAGE_SIZE;
pub const MAX_ARG_STRINGS: usize = 0x7FFF_FFFF;
pub const DEFAULT_ARG_BUDGET: usize = 32 * PAGE_SIZE; // 128KB
