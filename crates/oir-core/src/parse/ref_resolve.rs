use std::collections::HashSet;

use super::components::Components;
use super::parameter::{Parameter, ParameterOrRef};
use super::request_body::{RequestBody, RequestBodyOrRef};
use super::response::{Response, ResponseOrRef};
use super::schema::{Schema, SchemaOrRef};
use super::spec::OpenApiSpec;
use crate::error::ResolveError;

/// Looks up `$ref` targets in `components` on demand.
///
/// Nothing is expanded eagerly, so schema graphs that refer back to
/// themselves are fine. Only a chain of pure aliases (`A: $ref B`,
/// `B: $ref A`) is an error.
#[derive(Debug, Clone, Copy)]
pub struct RefResolver<'a> {
    components: Option<&'a Components>,
}

impl<'a> RefResolver<'a> {
    pub fn new(spec: &'a OpenApiSpec) -> Self {
        Self {
            components: spec.components.as_ref(),
        }
    }

    /// Follow refs until a concrete schema is reached.
    pub fn resolve(&self, schema_or_ref: &'a SchemaOrRef) -> Result<&'a Schema, ResolveError> {
        let mut current = schema_or_ref;
        let mut visited = HashSet::new();
        loop {
            match current {
                SchemaOrRef::Schema(schema) => return Ok(schema),
                SchemaOrRef::Ref { ref_path, .. } => {
                    if !visited.insert(ref_path.as_str()) {
                        return Err(ResolveError::CircularRef(ref_path.clone()));
                    }
                    current = self.lookup_schema(ref_path)?;
                }
            }
        }
    }

    /// One hop: the component entry a schema ref points at.
    pub fn lookup_schema(&self, ref_path: &str) -> Result<&'a SchemaOrRef, ResolveError> {
        let name = parse_ref_name(ref_path, "schemas")?;
        self.components
            .and_then(|c| c.schemas.get(name))
            .ok_or_else(|| ResolveError::RefTargetNotFound(ref_path.to_string()))
    }

    /// Name of the component a schema ref points at directly.
    pub fn ref_target_name(&self, ref_path: &'a str) -> Result<&'a str, ResolveError> {
        self.lookup_schema(ref_path)?;
        parse_ref_name(ref_path, "schemas")
    }

    /// Name of the component at the end of an alias chain.
    pub fn canonical_name(&self, ref_path: &'a str) -> Result<&'a str, ResolveError> {
        let mut path = ref_path;
        let mut visited = HashSet::new();
        loop {
            if !visited.insert(path) {
                return Err(ResolveError::CircularRef(path.to_string()));
            }
            match self.lookup_schema(path)? {
                SchemaOrRef::Schema(_) => return parse_ref_name(path, "schemas"),
                SchemaOrRef::Ref { ref_path, .. } => path = ref_path.as_str(),
            }
        }
    }

    /// Ref-aware equality. Two refs are equal when they alias the same
    /// component; anything else compares the resolved schemas.
    pub fn same_schema(&self, a: &'a SchemaOrRef, b: &'a SchemaOrRef) -> bool {
        match (a, b) {
            (SchemaOrRef::Ref { ref_path: pa, .. }, SchemaOrRef::Ref { ref_path: pb, .. }) => {
                match (self.canonical_name(pa), self.canonical_name(pb)) {
                    (Ok(na), Ok(nb)) => na == nb,
                    _ => pa == pb,
                }
            }
            _ => match (self.resolve(a), self.resolve(b)) {
                (Ok(sa), Ok(sb)) => std::ptr::eq(sa, sb) || sa == sb,
                _ => a == b,
            },
        }
    }

    pub fn resolve_parameter(
        &self,
        param: &'a ParameterOrRef,
    ) -> Result<&'a Parameter, ResolveError> {
        let mut current = param;
        let mut visited = HashSet::new();
        loop {
            match current {
                ParameterOrRef::Parameter(p) => return Ok(p),
                ParameterOrRef::Ref { ref_path } => {
                    if !visited.insert(ref_path.as_str()) {
                        return Err(ResolveError::CircularRef(ref_path.clone()));
                    }
                    let name = parse_ref_name(ref_path, "parameters")?;
                    current = self
                        .components
                        .and_then(|c| c.parameters.get(name))
                        .ok_or_else(|| ResolveError::RefTargetNotFound(ref_path.clone()))?;
                }
            }
        }
    }

    pub fn resolve_request_body(
        &self,
        body: &'a RequestBodyOrRef,
    ) -> Result<&'a RequestBody, ResolveError> {
        let mut current = body;
        let mut visited = HashSet::new();
        loop {
            match current {
                RequestBodyOrRef::RequestBody(b) => return Ok(b),
                RequestBodyOrRef::Ref { ref_path } => {
                    if !visited.insert(ref_path.as_str()) {
                        return Err(ResolveError::CircularRef(ref_path.clone()));
                    }
                    let name = parse_ref_name(ref_path, "requestBodies")?;
                    current = self
                        .components
                        .and_then(|c| c.request_bodies.get(name))
                        .ok_or_else(|| ResolveError::RefTargetNotFound(ref_path.clone()))?;
                }
            }
        }
    }

    pub fn resolve_response(
        &self,
        response: &'a ResponseOrRef,
    ) -> Result<&'a Response, ResolveError> {
        let mut current = response;
        let mut visited = HashSet::new();
        loop {
            match current {
                ResponseOrRef::Response(r) => return Ok(r),
                ResponseOrRef::Ref { ref_path } => {
                    if !visited.insert(ref_path.as_str()) {
                        return Err(ResolveError::CircularRef(ref_path.clone()));
                    }
                    let name = parse_ref_name(ref_path, "responses")?;
                    current = self
                        .components
                        .and_then(|c| c.responses.get(name))
                        .ok_or_else(|| ResolveError::RefTargetNotFound(ref_path.clone()))?;
                }
            }
        }
    }
}

/// Parse a `$ref` path like `#/components/schemas/Foo` and extract the name.
pub fn parse_ref_name<'a>(
    ref_path: &'a str,
    expected_section: &str,
) -> Result<&'a str, ResolveError> {
    let stripped = ref_path
        .strip_prefix("#/components/")
        .ok_or_else(|| ResolveError::InvalidRefFormat(ref_path.to_string()))?;
    let (section, name) = stripped
        .split_once('/')
        .ok_or_else(|| ResolveError::InvalidRefFormat(ref_path.to_string()))?;
    if section != expected_section || name.is_empty() || name.contains('/') {
        return Err(ResolveError::InvalidRefFormat(format!(
            "expected section '{}', got '{}' in {}",
            expected_section, section, ref_path
        )));
    }
    Ok(name)
}
