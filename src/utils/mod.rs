pub mod hex_utils;

pub use hex_utils::{strip_0x, to_hex_quantity, u64_to_hex_quantity};
