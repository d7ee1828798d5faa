use std::collections::{HashMap, HashSet};

use crate::ast::{Declaration, EnumDecl, Field, ModelDecl, PrimitiveKind, Schema, Type};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::utils::quote;

pub const FIELD_NUMBER_MAX: i64 = 536_870_911;
pub const RESERVED_RANGE: std::ops::RangeInclusive<i64> = 19_000..=19_999;

/// Checks a parsed schema and returns every problem found, in source order.
///
/// Symbol tables are populated before any field is checked, so forward
/// references within the schema resolve. The walk never stops early; each
/// violated rule contributes its own diagnostic.
pub fn validate_schema(schema: &Schema) -> Vec<Diagnostic> {
    let mut diagnostics = Diagnostics::new();

    if schema.namespace.is_empty() {
        diagnostics.add("Namespace cannot be empty", schema.location);
    }

    let mut declaration_names = HashSet::new();
    for decl in &schema.declarations {
        if !declaration_names.insert(decl.name()) {
            diagnostics.add(
                format!("Duplicate declaration name {}", quote(decl.name())),
                decl.location(),
            );
        }
    }

    let symbols = SymbolTable::build(schema);

    for decl in &schema.declarations {
        match decl {
            Declaration::Enum(enum_decl) => check_enum(enum_decl, &mut diagnostics),
            Declaration::Model(model) => check_model(model, &symbols, &mut diagnostics),
        }
    }

    diagnostics.into_vec()
}

struct SymbolTable<'a> {
    enums: HashMap<&'a str, &'a EnumDecl>,
    models: HashMap<&'a str, &'a ModelDecl>,
}

impl<'a> SymbolTable<'a> {
    fn build(schema: &'a Schema) -> SymbolTable<'a> {
        let mut enums = HashMap::new();
        let mut models = HashMap::new();

        for decl in &schema.declarations {
            match decl {
                Declaration::Enum(enum_decl) => {
                    enums.insert(enum_decl.name.as_str(), enum_decl);
                }
                Declaration::Model(model) => {
                    models.insert(model.name.as_str(), model);
                }
            }
        }

        SymbolTable { enums, models }
    }

    fn type_exists(&self, name: &str) -> bool {
        self.enums.contains_key(name) || self.models.contains_key(name)
    }
}

fn check_enum(enum_decl: &EnumDecl, diagnostics: &mut Diagnostics) {
    if enum_decl.values.is_empty() {
        diagnostics.add(
            format!(
                "Enum {} must have at least one value",
                quote(&enum_decl.name)
            ),
            enum_decl.location,
        );
        return;
    }

    let mut value_names = HashSet::new();
    let mut value_numbers = HashSet::new();

    for value in &enum_decl.values {
        if !value_names.insert(value.name.as_str()) {
            diagnostics.add(
                format!(
                    "Duplicate enum value name {} in enum {}",
                    quote(&value.name),
                    quote(&enum_decl.name)
                ),
                value.location,
            );
        }

        if !value_numbers.insert(value.value) {
            diagnostics.add(
                format!(
                    "Duplicate enum value {} in enum {}",
                    value.value,
                    quote(&enum_decl.name)
                ),
                value.location,
            );
        }
    }

    for value in &enum_decl.values {
        if value.value < 0 {
            diagnostics.add(
                format!("Enum value {} cannot be negative", quote(&value.name)),
                value.location,
            );
        }
    }
}

fn check_model(model: &ModelDecl, symbols: &SymbolTable, diagnostics: &mut Diagnostics) {
    if model.fields.is_empty() {
        diagnostics.add(
            format!("Model {} must have at least one field", quote(&model.name)),
            model.location,
        );
        return;
    }

    let mut field_numbers = HashSet::new();
    for field in &model.fields {
        if !field_numbers.insert(field.number) {
            diagnostics.add(
                format!(
                    "Duplicate field number {} in model {}",
                    field.number,
                    quote(&model.name)
                ),
                field.location,
            );
        }
    }

    for field in &model.fields {
        check_field_number(field, diagnostics);
        check_field_modifiers(field, diagnostics);
        check_type_exists(&field.ty, field, symbols, diagnostics);
        check_modifier_compatibility(field, diagnostics);
    }
}

fn check_field_number(field: &Field, diagnostics: &mut Diagnostics) {
    if field.number < 1 || field.number > FIELD_NUMBER_MAX {
        diagnostics.add(
            format!(
                "Field number {} is out of valid range (1-{})",
                field.number, FIELD_NUMBER_MAX
            ),
            field.location,
        );
    }

    if RESERVED_RANGE.contains(&field.number) {
        diagnostics.add(
            format!(
                "Field number {} is in reserved range (19000-19999)",
                field.number
            ),
            field.location,
        );
    }
}

fn check_field_modifiers(field: &Field, diagnostics: &mut Diagnostics) {
    let modifiers = field.modifiers;

    if modifiers.is_optional() && modifiers.is_repeated() {
        diagnostics.add(
            "Modifiers 'optional' and 'repeated' are mutually exclusive",
            field.location,
        );
    }

    if modifiers.is_packed() && !modifiers.is_repeated() {
        diagnostics.add("'packed' modifier requires 'repeated'", field.location);
    }

    if modifiers.is_bitmap() && !modifiers.is_repeated() {
        diagnostics.add("'bitmap' modifier requires 'repeated'", field.location);
    }

    if modifiers.is_packed() && modifiers.is_bitmap() {
        diagnostics.add(
            "Field cannot have both 'packed' and 'bitmap' modifiers",
            field.location,
        );
    }

    if modifiers.is_interned() && field.ty.primitive_kind() != Some(PrimitiveKind::String) {
        diagnostics.add("'interned' modifier requires a 'string' field", field.location);
    }
}

fn check_type_exists(ty: &Type, field: &Field, symbols: &SymbolTable, diagnostics: &mut Diagnostics) {
    if let Type::UserRef { name, .. } = ty {
        if !symbols.type_exists(name) {
            diagnostics.add(format!("Unknown type {}", quote(name)), field.location);
        }
    }
}

// Type-focused restatements of the modifier rules; these fire in addition
// to the generic checks above so one pass shows the full picture.
fn check_modifier_compatibility(field: &Field, diagnostics: &mut Diagnostics) {
    if field.modifiers.is_packed() && !field.ty.is_primitive() {
        diagnostics.add(
            "'packed' modifier can only be used with primitive types",
            field.location,
        );
    }

    if field.modifiers.is_interned()
        && field.ty.primitive_kind() != Some(PrimitiveKind::String)
    {
        diagnostics.add(
            "'interned' modifier can only be used with 'string' type",
            field.location,
        );
    }

    if field.modifiers.is_bitmap() && field.ty.primitive_kind() != Some(PrimitiveKind::Bool) {
        diagnostics.add(
            "'bitmap' modifier can only be used with 'bool' type",
            field.location,
        );
    }
}
