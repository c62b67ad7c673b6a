use crate::config::CodeGenOptions;
use crate::error::TransformError;
use crate::ir::{ApiInfo, CodeGenData};
use crate::parse::ref_resolve::RefResolver;
use crate::parse::schema::vendor_extensions;
use crate::parse::spec::OpenApiSpec;

use super::assembler::assemble;
use super::composite::flatten_composites;
use super::link_resolver::resolve_links;
use super::model_builder::ModelBuilder;
use super::operation_builder::{collect_operations, finalize_operations};
use super::type_mapper::{map_models, map_operations};

/// Build the code-generation IR for a parsed spec with default options.
pub fn build_code_gen_data(spec: &OpenApiSpec) -> Result<CodeGenData, TransformError> {
    build_code_gen_data_with_options(spec, &CodeGenOptions::default())
}

/// Build the code-generation IR with explicit options.
pub fn build_code_gen_data_with_options(
    spec: &OpenApiSpec,
    options: &CodeGenOptions,
) -> Result<CodeGenData, TransformError> {
    // Phase 1: Component models
    let mut builder = ModelBuilder::new(RefResolver::new(spec));
    if let Some(components) = &spec.components {
        builder.add_components(components)?;
    }
    log::debug!("declared {} component models", builder.registry().named.len());

    // Phase 2: Operation parameters, bodies and responses
    let mut operations = collect_operations(spec, &mut builder, options)?;

    // Phase 3: Array and dictionary links
    resolve_links(&mut builder)?;
    let mut registry = builder.into_registry();

    // Phase 4: Composite constituents
    flatten_composites(&mut registry)?;

    // Phase 5: Operation identities, results and body inlining
    finalize_operations(&mut operations, &registry, options)?;

    // Phase 6: Language mappings
    map_models(&mut registry, &options.languages);
    map_operations(&mut operations, &options.languages);

    let info = ApiInfo {
        title: spec.info.title.clone(),
        version: spec.info.version.clone(),
        description: spec.info.description.clone(),
    };
    Ok(assemble(
        info,
        registry,
        operations,
        vendor_extensions(&spec.extra),
    ))
}
