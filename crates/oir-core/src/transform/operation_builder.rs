use std::collections::{HashMap, HashSet};

use heck::ToPascalCase;
use indexmap::IndexMap;

use crate::config::{CodeGenOptions, NamingStrategy};
use crate::error::TransformError;
use crate::ir::{
    CollectionFormat, HttpMethod, Model, ModelId, ModelKind, ModelRegistry, Operation,
    Parameter, ParameterLocation, Response, ResponseCode,
};
use crate::parse::media_type::preferred_media_type;
use crate::parse::operation::{Operation as SpecOperation, PathItem};
use crate::parse::parameter::{Parameter as SpecParameter, ParameterLocation as SpecLocation};
use crate::parse::schema::vendor_extensions;
use crate::parse::spec::OpenApiSpec;

use super::composite::is_ambiguous_response;
use super::model_builder::ModelBuilder;
use super::name_normalizer::{normalize_name, route_to_name};

/// Vendor extension naming an operation's identity after cross-tag
/// deduplication upstream.
pub const DEDUPLICATED_OPERATION_ID: &str = "x-aws-nx-deduplicated-op-id";

/// Build every operation in document order: paths, then
/// get/post/put/delete/patch/options/head/trace.
///
/// Parameters, bodies and responses are added to the model graph here.
/// Identities, result selection and body inlining are left to
/// [`finalize_operations`], which needs composites flattened first.
pub fn collect_operations(
    spec: &OpenApiSpec,
    builder: &mut ModelBuilder<'_>,
    options: &CodeGenOptions,
) -> Result<Vec<Operation>, TransformError> {
    let mut operations = Vec::new();
    for (path, item) in &spec.paths {
        for method in HttpMethod::ALL {
            let Some(op) = method_operation(item, method) else {
                continue;
            };
            let operation = build_operation(builder, options, path, method, item, op)?;
            log::debug!(
                "collected {} {} as {}",
                method.as_str(),
                path,
                operation.operation_id
            );
            operations.push(operation);
        }
    }
    Ok(operations)
}

fn method_operation(item: &PathItem, method: HttpMethod) -> Option<&SpecOperation> {
    match method {
        HttpMethod::Get => item.get.as_ref(),
        HttpMethod::Post => item.post.as_ref(),
        HttpMethod::Put => item.put.as_ref(),
        HttpMethod::Delete => item.delete.as_ref(),
        HttpMethod::Patch => item.patch.as_ref(),
        HttpMethod::Options => item.options.as_ref(),
        HttpMethod::Head => item.head.as_ref(),
        HttpMethod::Trace => item.trace.as_ref(),
    }
}

fn build_operation(
    builder: &mut ModelBuilder<'_>,
    options: &CodeGenOptions,
    path: &str,
    method: HttpMethod,
    item: &PathItem,
    op: &SpecOperation,
) -> Result<Operation, TransformError> {
    let operation_id = match (options.naming_strategy, &op.operation_id) {
        (NamingStrategy::UseOperationId, Some(id)) => id.clone(),
        _ => route_to_name(method.as_str(), path),
    };
    let prefix = operation_id.to_pascal_case();

    let mut parameters = Vec::new();
    for param in merged_parameters(builder, item, op)? {
        parameters.push(build_parameter(builder, &prefix, param)?);
    }
    if let Some(body) = build_body(builder, &prefix, op)? {
        parameters.push(body);
    }

    let mut responses = Vec::with_capacity(op.responses.len());
    for (code, response) in &op.responses {
        let parsed: ResponseCode = code.parse().map_err(|_| TransformError::InvalidResponseCode {
            operation: operation_id.clone(),
            code: code.clone(),
        })?;
        let response = builder.resolver().resolve_response(response)?;
        let model = match preferred_media_type(&response.content) {
            Some((_, media)) => match &media.schema {
                Some(schema) => {
                    let hint = format!("{prefix}{code}Response");
                    Some(builder.occurrence(code, &hint, schema)?)
                }
                None => Some(builder.registry_mut().arena.push(Model::any(code.as_str()))),
            },
            None => None,
        };
        responses.push(Response {
            model,
            code: parsed,
            media_types: response.content.keys().cloned().collect(),
            description: response.description.clone(),
            vendor_extensions: vendor_extensions(&response.extra),
        });
    }
    responses.sort_by_key(|r| r.code);

    Ok(Operation {
        path: path.to_string(),
        method,
        name: normalize_name(&operation_id),
        unique_name: operation_id.clone(),
        operation_id,
        tag_identities: Vec::new(),
        tags: distinct_tags(&op.tags),
        parameters,
        responses,
        result: None,
        summary: op.summary.clone(),
        description: op.description.clone(),
        deprecated: op.deprecated.unwrap_or(false),
        vendor_extensions: vendor_extensions(&op.extra),
        identifiers: Default::default(),
    })
}

/// Tags in document order with repeats removed.
fn distinct_tags(tags: &[String]) -> Vec<String> {
    let mut distinct: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        if !distinct.contains(tag) {
            distinct.push(tag.clone());
        }
    }
    distinct
}

/// Path-level parameters overridden by operation-level ones on equal
/// `name` + `in`.
fn merged_parameters<'a>(
    builder: &ModelBuilder<'a>,
    item: &'a PathItem,
    op: &'a SpecOperation,
) -> Result<Vec<&'a SpecParameter>, TransformError> {
    let resolver = builder.resolver();
    let mut merged: Vec<&SpecParameter> = Vec::new();
    for param in &item.parameters {
        merged.push(resolver.resolve_parameter(param)?);
    }
    for param in &op.parameters {
        let param = resolver.resolve_parameter(param)?;
        match merged
            .iter_mut()
            .find(|p| p.name == param.name && p.location == param.location)
        {
            Some(existing) => *existing = param,
            None => merged.push(param),
        }
    }
    Ok(merged)
}

fn build_parameter(
    builder: &mut ModelBuilder<'_>,
    prefix: &str,
    param: &SpecParameter,
) -> Result<Parameter, TransformError> {
    let location = match param.location {
        SpecLocation::Path => ParameterLocation::Path,
        SpecLocation::Query => ParameterLocation::Query,
        SpecLocation::Header => ParameterLocation::Header,
        SpecLocation::Cookie => ParameterLocation::Cookie,
    };
    let position = match location {
        ParameterLocation::Path => "Path",
        ParameterLocation::Query => "Query",
        ParameterLocation::Header => "Header",
        ParameterLocation::Cookie => "Cookie",
        ParameterLocation::Body => "Body",
    };
    let is_required = param.required || location == ParameterLocation::Path;

    let model = match &param.schema {
        Some(schema) => {
            let hint = format!("{prefix}Request{position}Parameters");
            builder.occurrence(&param.name, &hint, schema)?
        }
        None => builder
            .registry_mut()
            .arena
            .push(Model::any(param.name.as_str())),
    };
    {
        let node = &mut builder.registry_mut().arena[model];
        node.is_required = is_required;
        node.deprecated = param.deprecated.unwrap_or(node.deprecated);
        if param.description.is_some() {
            node.description = param.description.clone();
        }
    }

    let collection_format = match location {
        ParameterLocation::Query | ParameterLocation::Header
            if is_array(builder.registry(), model) =>
        {
            collection_format(location, param.style.as_deref(), param.explode)
        }
        _ => None,
    };

    Ok(Parameter {
        model,
        location,
        name: param.name.clone(),
        prop: normalize_name(&param.name).camel_case,
        media_type: None,
        collection_format,
        is_required,
        inlined: false,
        description: param.description.clone(),
        vendor_extensions: vendor_extensions(&param.extra),
    })
}

fn is_array(registry: &ModelRegistry, id: ModelId) -> bool {
    registry.arena[registry.canonical(id)].kind == ModelKind::Array
}

/// Map `style`/`explode` to how array values are serialized.
pub fn collection_format(
    location: ParameterLocation,
    style: Option<&str>,
    explode: Option<bool>,
) -> Option<CollectionFormat> {
    let style = style.unwrap_or(match location {
        ParameterLocation::Query | ParameterLocation::Cookie => "form",
        _ => "simple",
    });
    let explode = explode.unwrap_or(style == "form");
    match style {
        "form" if explode => Some(CollectionFormat::Multi),
        "form" | "simple" => Some(CollectionFormat::Csv),
        "spaceDelimited" => Some(CollectionFormat::Ssv),
        "pipeDelimited" => Some(CollectionFormat::Pipes),
        _ => None,
    }
}

fn build_body(
    builder: &mut ModelBuilder<'_>,
    prefix: &str,
    op: &SpecOperation,
) -> Result<Option<Parameter>, TransformError> {
    let Some(body) = &op.request_body else {
        return Ok(None);
    };
    let body = builder.resolver().resolve_request_body(body)?;
    let Some((media_type, media)) = preferred_media_type(&body.content) else {
        log::warn!("{prefix}: request body without content is ignored");
        return Ok(None);
    };

    let model = match &media.schema {
        Some(schema) => {
            let hint = format!("{prefix}RequestBodyParameters");
            builder.occurrence("body", &hint, schema)?
        }
        None => builder.registry_mut().arena.push(Model::any("body")),
    };
    {
        let node = &mut builder.registry_mut().arena[model];
        node.is_required = body.required;
        if body.description.is_some() {
            node.description = body.description.clone();
        }
    }

    Ok(Some(Parameter {
        model,
        location: ParameterLocation::Body,
        name: "body".to_string(),
        prop: "body".to_string(),
        media_type: Some(media_type.clone()),
        collection_format: None,
        is_required: body.required,
        inlined: false,
        description: body.description.clone(),
        vendor_extensions: vendor_extensions(&body.extra),
    }))
}

/// Assign identities, pick result responses, decide body inlining and
/// reject responses that cannot be decoded.
pub fn finalize_operations(
    operations: &mut [Operation],
    registry: &ModelRegistry,
    options: &CodeGenOptions,
) -> Result<(), TransformError> {
    assign_identities(operations, options)?;
    for op in operations.iter_mut() {
        op.result = select_result(&op.responses);
        decide_body_inlining(op, registry);
        for response in &op.responses {
            if let Some(model) = response.model {
                if is_ambiguous_response(registry, model) {
                    return Err(TransformError::AmbiguousResponse {
                        operation: op.operation_id.clone(),
                        code: response.code.to_string(),
                    });
                }
            }
        }
    }
    Ok(())
}

fn assign_identities(
    operations: &mut [Operation],
    options: &CodeGenOptions,
) -> Result<(), TransformError> {
    let mut untagged: HashSet<String> = HashSet::new();
    let mut tagged: HashSet<(String, String)> = HashSet::new();
    // unique name -> whether it came from the deduplication extension
    let mut assigned: HashMap<String, bool> = HashMap::new();

    for op in operations.iter_mut() {
        op.tag_identities = op
            .tags
            .iter()
            .map(|tag| format!("{tag}.{}", op.operation_id))
            .collect();

        let dedup_id = op
            .vendor_extensions
            .get(DEDUPLICATED_OPERATION_ID)
            .and_then(|v| v.as_str())
            .map(str::to_string);

        if let Some(dedup_id) = dedup_id {
            claim_unique_name(&mut assigned, &dedup_id, true, options)?;
            op.name = normalize_name(&dedup_id);
            op.unique_name = dedup_id;
            continue;
        }

        let unique_name = match op.tags.first() {
            None => {
                if !untagged.insert(op.operation_id.clone()) {
                    return Err(TransformError::DuplicateOperationId(
                        op.operation_id.clone(),
                    ));
                }
                op.operation_id.clone()
            }
            Some(first) => {
                for tag in &op.tags {
                    if !tagged.insert((tag.clone(), op.operation_id.clone())) {
                        return Err(TransformError::DuplicateTaggedOperationId {
                            tag: tag.clone(),
                            operation_id: op.operation_id.clone(),
                        });
                    }
                }
                format!("{first}.{}", op.operation_id)
            }
        };
        claim_unique_name(&mut assigned, &unique_name, false, options)?;
        op.unique_name = unique_name;
        op.name = normalize_name(&op.operation_id);
    }
    Ok(())
}

/// Record `name` as taken. A clash involving the deduplication extension is
/// only tolerated when its verification is off; the assembler then keeps the
/// first operation.
fn claim_unique_name(
    assigned: &mut HashMap<String, bool>,
    name: &str,
    via_extension: bool,
    options: &CodeGenOptions,
) -> Result<(), TransformError> {
    let Some(earlier_via_extension) = assigned.get(name).copied() else {
        assigned.insert(name.to_string(), via_extension);
        return Ok(());
    };
    if !(earlier_via_extension || via_extension) {
        return Err(TransformError::DuplicateOperationId(name.to_string()));
    }
    if options.verify_deduplicated_operation_ids {
        return Err(TransformError::DuplicateDeduplicatedOperationId(
            name.to_string(),
        ));
    }
    log::warn!("{name} is claimed by more than one operation; keeping the first");
    Ok(())
}

/// Lowest numeric 2xx, else `2XX`, else `default`. Expects sorted responses.
fn select_result(responses: &[Response]) -> Option<ResponseCode> {
    let codes = || responses.iter().map(|r| r.code);
    codes()
        .find(|c| matches!(c, ResponseCode::Status(_)) && c.is_success())
        .or_else(|| codes().find(|c| *c == ResponseCode::Range(2)))
        .or_else(|| codes().find(|c| *c == ResponseCode::Default))
}

/// The body is inlined when it is the only parameter, or when it is an
/// object none of whose property names collides with another parameter.
fn decide_body_inlining(op: &mut Operation, registry: &ModelRegistry) {
    let others: Vec<&str> = op
        .parameters
        .iter()
        .filter(|p| p.location != ParameterLocation::Body)
        .map(|p| p.name.as_str())
        .collect();
    let Some(body_index) = op
        .parameters
        .iter()
        .position(|p| p.location == ParameterLocation::Body)
    else {
        return;
    };

    let target = registry.canonical(op.parameters[body_index].model);
    let inlined = others.is_empty()
        || (registry.is_object(target)
            && registry.arena[target]
                .properties
                .iter()
                .all(|p| !others.contains(&registry.arena[*p].name.as_str())));
    op.parameters[body_index].inlined = inlined;
}
