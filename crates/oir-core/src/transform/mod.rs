pub mod assembler;
pub mod composite;
pub mod link_resolver;
pub mod model_builder;
pub mod name_normalizer;
pub mod operation_builder;
pub mod spec_to_ir;
pub mod type_mapper;

pub use crate::config::CodeGenOptions;
pub use spec_to_ir::{build_code_gen_data, build_code_gen_data_with_options};
