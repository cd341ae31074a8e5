mod compiler;
mod html;
mod payload;

pub use compiler::{compile_instruction, CompiledInstruction};
pub use payload::decode_copy_payload;
