use std::collections::HashMap;

use tagwire_wire::{ByteReader, ByteWriter};

use crate::ast::{
    Declaration, EnumDecl, EnumValue, Field, ModelDecl, Modifiers, PrimitiveKind, Schema, Type,
};
use crate::diagnostics::SourceLocation;
use crate::emitter::Emitter;
use crate::error::CompileError;
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::validator::validate_schema;

/// The two generated artifacts for one schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifacts {
    pub header: String,
    pub source: String,
}

/// Runs lexing, parsing and validation and returns the checked schema.
/// Validation findings are reported together in `CompileError::Invalid`.
pub fn check_schema(text: &str) -> Result<Schema, CompileError> {
    let schema = Parser::new(Lexer::new(text)).parse_schema()?;

    let diagnostics = validate_schema(&schema);
    if !diagnostics.is_empty() {
        return Err(CompileError::Invalid(diagnostics));
    }

    Ok(schema)
}

/// The full pipeline: check the schema, then emit both artifacts using the
/// namespace name as the base file name.
pub fn compile_schema(text: &str) -> Result<(Schema, Artifacts), CompileError> {
    let schema = check_schema(text)?;

    let artifacts = {
        let emitter = Emitter::new(&schema);
        Artifacts {
            header: emitter.generate_header(),
            source: emitter.generate_source(),
        }
    };

    Ok((schema, artifacts))
}

/// Encodes a validated schema into its compact binary form: the namespace,
/// then each declaration with a kind byte and its values or fields. Type
/// references are zigzag varints — primitives as `!kind_index`, user types
/// as the index of the target declaration.
pub fn encode_binary_schema(schema: &Schema) -> Result<Vec<u8>, CompileError> {
    let mut declaration_index: HashMap<&str, usize> = HashMap::new();
    for (i, decl) in schema.declarations.iter().enumerate() {
        declaration_index.insert(decl.name(), i);
    }

    let mut writer = ByteWriter::new();
    writer.write_string(&schema.namespace);
    writer.write_var_uint(schema.declarations.len() as u64);

    for decl in &schema.declarations {
        match decl {
            Declaration::Enum(enum_decl) => {
                writer.write_string(&enum_decl.name);
                writer.write_byte(0);
                writer.write_var_uint(enum_decl.values.len() as u64);
                for value in &enum_decl.values {
                    writer.write_string(&value.name);
                    writer.write_var_uint(value.value as u64);
                }
            }
            Declaration::Model(model) => {
                writer.write_string(&model.name);
                writer.write_byte(1);
                writer.write_var_uint(model.fields.len() as u64);
                for field in &model.fields {
                    writer.write_string(&field.name);

                    let type_code = match &field.ty {
                        Type::Primitive { kind, .. } => !(kind.index() as i64),
                        Type::UserRef { name, .. } => {
                            *declaration_index.get(name.as_str()).ok_or_else(|| {
                                CompileError::Encode(format!(
                                    "Type '{}' is not declared in this schema",
                                    name
                                ))
                            })? as i64
                        }
                    };
                    writer.write_var_int(type_code);
                    writer.write_byte(field.modifiers.bits());
                    writer.write_var_uint(field.number as u64);
                }
            }
        }
    }

    Ok(writer.into_bytes())
}

/// Decodes the binary form produced by [`encode_binary_schema`]. Source
/// locations are not preserved; decoded nodes carry the default location.
pub fn decode_binary_schema(buffer: &[u8]) -> Result<Schema, CompileError> {
    struct FieldTemp {
        name: String,
        type_code: i64,
        modifiers: Modifiers,
        number: i64,
    }

    enum DeclTemp {
        Enum {
            name: String,
            values: Vec<(String, i64)>,
        },
        Model {
            name: String,
            fields: Vec<FieldTemp>,
        },
    }

    fn context<T>(result: Result<T, ()>, what: &str) -> Result<T, CompileError> {
        result.map_err(|_| CompileError::Decode(format!("Failed to read {}", what)))
    }

    let mut reader = ByteReader::new(buffer);

    let namespace = context(reader.read_string(), "namespace")?.into_owned();
    let declaration_count = context(reader.read_var_uint(), "declaration count")?;

    // First pass: raw declarations with unresolved type codes.
    let mut temps: Vec<DeclTemp> = Vec::new();
    for _ in 0..declaration_count {
        let name = context(reader.read_string(), "declaration name")?.into_owned();
        let kind = context(reader.read_byte(), "declaration kind")?;

        match kind {
            0 => {
                let value_count = context(reader.read_var_uint(), "enum value count")?;
                let mut values = Vec::new();
                for _ in 0..value_count {
                    let value_name = context(reader.read_string(), "enum value name")?.into_owned();
                    let value = context(reader.read_var_uint(), "enum value")?;
                    values.push((value_name, value as i64));
                }
                temps.push(DeclTemp::Enum { name, values });
            }
            1 => {
                let field_count = context(reader.read_var_uint(), "field count")?;
                let mut fields = Vec::new();
                for _ in 0..field_count {
                    let field_name = context(reader.read_string(), "field name")?.into_owned();
                    let type_code = context(reader.read_var_int(), "field type")?;
                    let modifiers =
                        Modifiers::from_bits(context(reader.read_byte(), "field modifiers")?);
                    let number = context(reader.read_var_uint(), "field number")?;
                    fields.push(FieldTemp {
                        name: field_name,
                        type_code,
                        modifiers,
                        number: number as i64,
                    });
                }
                temps.push(DeclTemp::Model { name, fields });
            }
            other => {
                return Err(CompileError::Decode(format!(
                    "Invalid declaration kind {}",
                    other
                )));
            }
        }
    }

    // Second pass: resolve type codes against the declaration list.
    let declaration_names: Vec<&str> = temps
        .iter()
        .map(|temp| match temp {
            DeclTemp::Enum { name, .. } => name.as_str(),
            DeclTemp::Model { name, .. } => name.as_str(),
        })
        .collect();

    let mut declarations = Vec::with_capacity(temps.len());
    for temp in &temps {
        match temp {
            DeclTemp::Enum { name, values } => {
                declarations.push(Declaration::Enum(EnumDecl {
                    name: name.clone(),
                    values: values
                        .iter()
                        .map(|(value_name, value)| EnumValue {
                            name: value_name.clone(),
                            value: *value,
                            location: SourceLocation::default(),
                        })
                        .collect(),
                    location: SourceLocation::default(),
                }));
            }
            DeclTemp::Model { name, fields } => {
                let mut resolved = Vec::with_capacity(fields.len());
                for field in fields {
                    let ty = if field.type_code < 0 {
                        let kind = u8::try_from(!field.type_code)
                            .ok()
                            .and_then(PrimitiveKind::from_index)
                            .ok_or_else(|| {
                                CompileError::Decode(format!(
                                    "Invalid primitive type index {} for field {}",
                                    field.type_code, field.name
                                ))
                            })?;
                        Type::Primitive {
                            kind,
                            location: SourceLocation::default(),
                        }
                    } else {
                        let index = field.type_code as usize;
                        let target = declaration_names.get(index).ok_or_else(|| {
                            CompileError::Decode(format!(
                                "Invalid declaration index {} for field {}",
                                field.type_code, field.name
                            ))
                        })?;
                        Type::UserRef {
                            name: (*target).to_string(),
                            location: SourceLocation::default(),
                        }
                    };

                    resolved.push(Field {
                        ty,
                        name: field.name.clone(),
                        number: field.number,
                        modifiers: field.modifiers,
                        location: SourceLocation::default(),
                    });
                }

                declarations.push(Declaration::Model(ModelDecl {
                    name: name.clone(),
                    fields: resolved,
                    location: SourceLocation::default(),
                }));
            }
        }
    }

    Ok(Schema {
        namespace,
        declarations,
        location: SourceLocation::default(),
    })
}
