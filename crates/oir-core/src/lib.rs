pub mod config;
pub mod error;
pub mod ir;
pub mod parse;
pub mod transform;

pub use transform::{CodeGenOptions, build_code_gen_data, build_code_gen_data_with_options};
