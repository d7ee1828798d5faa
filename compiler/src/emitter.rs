use tagwire_wire::{make_tag, WireType};

use crate::ast::{Declaration, EnumDecl, Field, ModelDecl, PrimitiveKind, Schema, Type};

/// Turns a validated schema into the two generated C++ artifacts: a header
/// declaring the types and a source file implementing `serialize` and
/// `deserialize` against the wire format.
///
/// The emitter only reads the schema; output is byte-stable across runs.
/// Field numbers are assumed to be in range (the validator guarantees this
/// before emission).
pub struct Emitter<'a> {
    schema: &'a Schema,
    base_name: String,
}

/// How a value of a given type travels on the wire.
enum Payload {
    /// Integer primitives: varint of the (cast) numeric value.
    Varint,
    /// Booleans: a single 0/1 byte.
    Bool,
    /// `float`: four little-endian bytes of the bit pattern.
    Float,
    /// `double`: eight little-endian bytes of the bit pattern.
    Double,
    /// Strings: varint length then the raw bytes.
    Str,
    /// `byte`: varint length (1 on encode) then the raw byte.
    Byte,
    /// Enums: varint of the integer ordinal.
    Enum,
    /// Nested models: varint length then the recursively serialized bytes.
    Message(String),
}

/// Where a decoded value lands.
enum Store<'a> {
    /// `member = value;` — singular and optional members both accept this.
    Assign(&'a str),
    /// `member.push_back(value);`
    Push(&'a str),
}

// File-local helpers emitted once into every generated source file, between
// the include lines and the namespace frame.
const RUNTIME_HELPERS: &str = r#"namespace {

inline void write_varint(std::vector<uint8_t>& buffer, uint64_t value) {
  while (value > 0x7F) {
    buffer.push_back(static_cast<uint8_t>((value & 0x7F) | 0x80));
    value >>= 7;
  }
  buffer.push_back(static_cast<uint8_t>(value));
}

inline bool read_varint(const std::vector<uint8_t>& data, size_t& pos, uint64_t& value) {
  value = 0;
  int shift = 0;
  while (pos < data.size()) {
    uint8_t byte = data[pos++];
    value |= static_cast<uint64_t>(byte & 0x7F) << shift;
    if ((byte & 0x80) == 0) {
      return true;
    }
    shift += 7;
    if (shift >= 64) {
      return false;
    }
  }
  return false;
}

inline void write_fixed32(std::vector<uint8_t>& buffer, uint32_t value) {
  for (int i = 0; i < 4; ++i) {
    buffer.push_back(static_cast<uint8_t>((value >> (i * 8)) & 0xFF));
  }
}

inline void write_fixed64(std::vector<uint8_t>& buffer, uint64_t value) {
  for (int i = 0; i < 8; ++i) {
    buffer.push_back(static_cast<uint8_t>((value >> (i * 8)) & 0xFF));
  }
}

inline bool read_fixed32(const std::vector<uint8_t>& data, size_t& pos, uint32_t& value) {
  if (pos + 4 > data.size()) {
    return false;
  }
  value = 0;
  for (int i = 0; i < 4; ++i) {
    value |= static_cast<uint32_t>(data[pos + i]) << (i * 8);
  }
  pos += 4;
  return true;
}

inline bool read_fixed64(const std::vector<uint8_t>& data, size_t& pos, uint64_t& value) {
  if (pos + 8 > data.size()) {
    return false;
  }
  value = 0;
  for (int i = 0; i < 8; ++i) {
    value |= static_cast<uint64_t>(data[pos + i]) << (i * 8);
  }
  pos += 8;
  return true;
}

inline bool skip_field(const std::vector<uint8_t>& data, size_t& pos, uint8_t wire_type) {
  switch (wire_type) {
  case 0: {
    uint64_t value = 0;
    return read_varint(data, pos, value);
  }
  case 1:
    if (pos + 8 > data.size()) {
      return false;
    }
    pos += 8;
    return true;
  case 2: {
    uint64_t length = 0;
    if (!read_varint(data, pos, length)) {
      return false;
    }
    if (length > data.size() - pos) {
      return false;
    }
    pos += static_cast<size_t>(length);
    return true;
  }
  case 5:
    if (pos + 4 > data.size()) {
      return false;
    }
    pos += 4;
    return true;
  default:
    return false;
  }
}

} // namespace

"#;

impl<'a> Emitter<'a> {
    pub fn new(schema: &'a Schema) -> Emitter<'a> {
        let base_name = schema.namespace.clone();
        Emitter { schema, base_name }
    }

    /// Overrides the base file name used for the header include; the default
    /// is the schema's namespace name.
    pub fn with_base_name(schema: &'a Schema, base_name: impl Into<String>) -> Emitter<'a> {
        Emitter {
            schema,
            base_name: base_name.into(),
        }
    }

    pub fn generate_header(&self) -> String {
        let mut out = String::new();

        out.push_str("#pragma once\n\n");
        out.push_str("#include <cstdint>\n");
        out.push_str("#include <string>\n");
        out.push_str("#include <vector>\n");
        out.push_str("#include <optional>\n");
        out.push_str("#include <memory>\n\n");

        out.push_str(&format!("namespace {} {{\n\n", self.schema.namespace));

        for decl in &self.schema.declarations {
            match decl {
                Declaration::Enum(enum_decl) => self.emit_enum_declaration(&mut out, enum_decl),
                Declaration::Model(model) => self.emit_model_declaration(&mut out, model),
            }
        }

        out.push_str(&format!("}} // namespace {}\n", self.schema.namespace));
        out
    }

    pub fn generate_source(&self) -> String {
        let mut out = String::new();

        out.push_str(&format!("#include \"{}.hpp\"\n", self.base_name));
        out.push_str("#include <cstring>\n\n");

        out.push_str(RUNTIME_HELPERS);

        out.push_str(&format!("namespace {} {{\n\n", self.schema.namespace));

        for decl in &self.schema.declarations {
            if let Declaration::Model(model) = decl {
                self.emit_serialize_method(&mut out, model);
                self.emit_deserialize_method(&mut out, model);
            }
        }

        out.push_str(&format!("}} // namespace {}\n", self.schema.namespace));
        out
    }

    fn emit_enum_declaration(&self, out: &mut String, enum_decl: &EnumDecl) {
        out.push_str(&format!("enum class {} : int32_t {{\n", enum_decl.name));

        for (i, value) in enum_decl.values.iter().enumerate() {
            out.push_str(&format!("  {} = {}", value.name, value.value));
            if i + 1 < enum_decl.values.len() {
                out.push(',');
            }
            out.push('\n');
        }

        out.push_str("};\n\n");
    }

    fn emit_model_declaration(&self, out: &mut String, model: &ModelDecl) {
        out.push_str(&format!("class {} {{\n", model.name));
        out.push_str("public:\n");
        out.push_str(&format!("  {}() = default;\n\n", model.name));

        for field in &model.fields {
            out.push_str(&format!(
                "  {} {}{};\n",
                self.field_type(field),
                field.name,
                self.default_initializer(field)
            ));
        }

        out.push('\n');
        out.push_str("  std::vector<uint8_t> serialize() const;\n");
        out.push_str("  bool deserialize(const std::vector<uint8_t>& data);\n");
        out.push_str("};\n\n");
    }

    fn emit_serialize_method(&self, out: &mut String, model: &ModelDecl) {
        out.push_str(&format!(
            "std::vector<uint8_t> {}::serialize() const {{\n",
            model.name
        ));
        out.push_str("  std::vector<uint8_t> buffer;\n");
        out.push_str("  buffer.reserve(64);\n\n");

        for field in &model.fields {
            self.emit_field_serializer(out, field);
        }

        out.push_str("  return buffer;\n");
        out.push_str("}\n\n");
    }

    fn emit_field_serializer(&self, out: &mut String, field: &Field) {
        let payload = self.payload(&field.ty);
        let tag = make_tag(field.number as u32, self.wire_type(field));
        let name = &field.name;

        if field.modifiers.is_repeated() {
            out.push_str(&format!("  if (!{}.empty()) {{\n", name));

            if field.modifiers.is_packed() {
                // One length-delimited record holding the concatenated
                // per-element payloads.
                let packed_tag = make_tag(field.number as u32, WireType::LengthDelimited);
                out.push_str(&format!("    write_varint(buffer, {});\n", packed_tag));
                out.push_str("    std::vector<uint8_t> packed;\n");
                out.push_str(&format!("    for (const auto& item : {}) {{\n", name));
                self.emit_value_writer(out, &payload, "packed", "item", "      ");
                out.push_str("    }\n");
                out.push_str("    write_varint(buffer, packed.size());\n");
                out.push_str("    buffer.insert(buffer.end(), packed.begin(), packed.end());\n");
            } else {
                out.push_str(&format!("    for (const auto& item : {}) {{\n", name));
                out.push_str(&format!("      write_varint(buffer, {});\n", tag));
                self.emit_value_writer(out, &payload, "buffer", "item", "      ");
                out.push_str("    }\n");
            }

            out.push_str("  }\n\n");
        } else if field.modifiers.is_optional() {
            out.push_str(&format!("  if ({}.has_value()) {{\n", name));
            out.push_str(&format!("    write_varint(buffer, {});\n", tag));
            self.emit_value_writer(out, &payload, "buffer", &format!("(*{})", name), "    ");
            out.push_str("  }\n\n");
        } else {
            out.push_str("  {\n");
            out.push_str(&format!("    write_varint(buffer, {});\n", tag));
            self.emit_value_writer(out, &payload, "buffer", name, "    ");
            out.push_str("  }\n\n");
        }
    }

    fn emit_value_writer(
        &self,
        out: &mut String,
        payload: &Payload,
        target: &str,
        value: &str,
        indent: &str,
    ) {
        match payload {
            Payload::Varint | Payload::Enum => {
                out.push_str(&format!(
                    "{}write_varint({}, static_cast<uint64_t>({}));\n",
                    indent, target, value
                ));
            }
            Payload::Bool => {
                out.push_str(&format!(
                    "{}{}.push_back({} ? 1 : 0);\n",
                    indent, target, value
                ));
            }
            Payload::Float => {
                out.push_str(&format!("{}float fval = {};\n", indent, value));
                out.push_str(&format!("{}uint32_t bits = 0;\n", indent));
                out.push_str(&format!(
                    "{}std::memcpy(&bits, &fval, sizeof(float));\n",
                    indent
                ));
                out.push_str(&format!("{}write_fixed32({}, bits);\n", indent, target));
            }
            Payload::Double => {
                out.push_str(&format!("{}double dval = {};\n", indent, value));
                out.push_str(&format!("{}uint64_t bits = 0;\n", indent));
                out.push_str(&format!(
                    "{}std::memcpy(&bits, &dval, sizeof(double));\n",
                    indent
                ));
                out.push_str(&format!("{}write_fixed64({}, bits);\n", indent, target));
            }
            Payload::Str => {
                out.push_str(&format!(
                    "{}write_varint({}, {}.size());\n",
                    indent, target, value
                ));
                out.push_str(&format!(
                    "{}{}.insert({}.end(), {}.begin(), {}.end());\n",
                    indent, target, target, value, value
                ));
            }
            Payload::Byte => {
                out.push_str(&format!("{}write_varint({}, 1);\n", indent, target));
                out.push_str(&format!("{}{}.push_back({});\n", indent, target, value));
            }
            Payload::Message(_) => {
                out.push_str(&format!(
                    "{}std::vector<uint8_t> nested = {}.serialize();\n",
                    indent, value
                ));
                out.push_str(&format!(
                    "{}write_varint({}, nested.size());\n",
                    indent, target
                ));
                out.push_str(&format!(
                    "{}{}.insert({}.end(), nested.begin(), nested.end());\n",
                    indent, target, target
                ));
            }
        }
    }

    fn emit_deserialize_method(&self, out: &mut String, model: &ModelDecl) {
        out.push_str(&format!(
            "bool {}::deserialize(const std::vector<uint8_t>& data) {{\n",
            model.name
        ));
        out.push_str("  size_t pos = 0;\n");
        out.push_str("  while (pos < data.size()) {\n");
        out.push_str("    uint64_t tag = 0;\n");
        out.push_str("    if (!read_varint(data, pos, tag)) {\n");
        out.push_str("      return false;\n");
        out.push_str("    }\n");
        out.push_str("    uint32_t field_number = static_cast<uint32_t>(tag >> 3);\n");
        out.push_str("    uint8_t wire_type = static_cast<uint8_t>(tag & 0x7);\n\n");
        out.push_str("    switch (field_number) {\n");

        for field in &model.fields {
            self.emit_field_deserializer(out, field);
        }

        out.push_str("    default:\n");
        out.push_str("      if (!skip_field(data, pos, wire_type)) {\n");
        out.push_str("        return false;\n");
        out.push_str("      }\n");
        out.push_str("      break;\n");
        out.push_str("    }\n");
        out.push_str("  }\n");
        out.push_str("  return true;\n");
        out.push_str("}\n\n");
    }

    // The payload is decoded according to the declared field shape, not the
    // wire type carried in the tag.
    fn emit_field_deserializer(&self, out: &mut String, field: &Field) {
        let payload = self.payload(&field.ty);
        let element_type = self.cpp_type(&field.ty);
        let name = &field.name;

        out.push_str(&format!("    case {}: {{\n", field.number));

        if field.modifiers.is_packed() {
            out.push_str("      uint64_t length = 0;\n");
            out.push_str("      if (!read_varint(data, pos, length)) {\n");
            out.push_str("        return false;\n");
            out.push_str("      }\n");
            out.push_str("      if (length > data.size() - pos) {\n");
            out.push_str("        return false;\n");
            out.push_str("      }\n");
            out.push_str("      size_t end = pos + static_cast<size_t>(length);\n");
            out.push_str("      while (pos < end) {\n");
            self.emit_value_reader(out, &payload, &element_type, &Store::Push(name), "        ");
            out.push_str("      }\n");
            // A partial trailing element read past the declared length.
            out.push_str("      if (pos != end) {\n");
            out.push_str("        return false;\n");
            out.push_str("      }\n");
        } else if field.modifiers.is_repeated() {
            self.emit_value_reader(out, &payload, &element_type, &Store::Push(name), "      ");
        } else {
            self.emit_value_reader(out, &payload, &element_type, &Store::Assign(name), "      ");
        }

        out.push_str("      break;\n");
        out.push_str("    }\n");
    }

    fn emit_value_reader(
        &self,
        out: &mut String,
        payload: &Payload,
        element_type: &str,
        store: &Store,
        indent: &str,
    ) {
        match payload {
            Payload::Varint | Payload::Bool | Payload::Enum => {
                out.push_str(&format!("{}uint64_t raw = 0;\n", indent));
                out.push_str(&format!("{}if (!read_varint(data, pos, raw)) {{\n", indent));
                out.push_str(&format!("{}  return false;\n", indent));
                out.push_str(&format!("{}}}\n", indent));
                let value = match payload {
                    Payload::Bool => "(raw != 0)".to_string(),
                    _ => format!("static_cast<{}>(raw)", element_type),
                };
                self.emit_store(out, store, &value, false, indent);
            }
            Payload::Float => {
                out.push_str(&format!("{}uint32_t bits = 0;\n", indent));
                out.push_str(&format!(
                    "{}if (!read_fixed32(data, pos, bits)) {{\n",
                    indent
                ));
                out.push_str(&format!("{}  return false;\n", indent));
                out.push_str(&format!("{}}}\n", indent));
                out.push_str(&format!("{}float value = 0;\n", indent));
                out.push_str(&format!(
                    "{}std::memcpy(&value, &bits, sizeof(float));\n",
                    indent
                ));
                self.emit_store(out, store, "value", false, indent);
            }
            Payload::Double => {
                out.push_str(&format!("{}uint64_t bits = 0;\n", indent));
                out.push_str(&format!(
                    "{}if (!read_fixed64(data, pos, bits)) {{\n",
                    indent
                ));
                out.push_str(&format!("{}  return false;\n", indent));
                out.push_str(&format!("{}}}\n", indent));
                out.push_str(&format!("{}double value = 0;\n", indent));
                out.push_str(&format!(
                    "{}std::memcpy(&value, &bits, sizeof(double));\n",
                    indent
                ));
                self.emit_store(out, store, "value", false, indent);
            }
            Payload::Str => {
                self.emit_length_prefix_reader(out, indent);
                out.push_str(&format!(
                    "{}std::string value(reinterpret_cast<const char*>(data.data() + pos), static_cast<size_t>(item_length));\n",
                    indent
                ));
                out.push_str(&format!(
                    "{}pos += static_cast<size_t>(item_length);\n",
                    indent
                ));
                self.emit_store(out, store, "value", true, indent);
            }
            Payload::Byte => {
                self.emit_length_prefix_reader(out, indent);
                out.push_str(&format!(
                    "{}uint8_t value = item_length > 0 ? data[pos] : 0;\n",
                    indent
                ));
                out.push_str(&format!(
                    "{}pos += static_cast<size_t>(item_length);\n",
                    indent
                ));
                self.emit_store(out, store, "value", false, indent);
            }
            Payload::Message(model_name) => {
                self.emit_length_prefix_reader(out, indent);
                out.push_str(&format!(
                    "{}std::vector<uint8_t> nested(data.begin() + pos, data.begin() + pos + static_cast<size_t>(item_length));\n",
                    indent
                ));
                out.push_str(&format!(
                    "{}pos += static_cast<size_t>(item_length);\n",
                    indent
                ));
                out.push_str(&format!("{}{} value;\n", indent, model_name));
                out.push_str(&format!("{}if (!value.deserialize(nested)) {{\n", indent));
                out.push_str(&format!("{}  return false;\n", indent));
                out.push_str(&format!("{}}}\n", indent));
                self.emit_store(out, store, "value", true, indent);
            }
        }
    }

    fn emit_length_prefix_reader(&self, out: &mut String, indent: &str) {
        out.push_str(&format!("{}uint64_t item_length = 0;\n", indent));
        out.push_str(&format!(
            "{}if (!read_varint(data, pos, item_length)) {{\n",
            indent
        ));
        out.push_str(&format!("{}  return false;\n", indent));
        out.push_str(&format!("{}}}\n", indent));
        out.push_str(&format!(
            "{}if (item_length > data.size() - pos) {{\n",
            indent
        ));
        out.push_str(&format!("{}  return false;\n", indent));
        out.push_str(&format!("{}}}\n", indent));
    }

    fn emit_store(
        &self,
        out: &mut String,
        store: &Store,
        value: &str,
        movable: bool,
        indent: &str,
    ) {
        let value = if movable {
            format!("std::move({})", value)
        } else {
            value.to_string()
        };
        match store {
            Store::Assign(name) => {
                out.push_str(&format!("{}{} = {};\n", indent, name, value));
            }
            Store::Push(name) => {
                out.push_str(&format!("{}{}.push_back({});\n", indent, name, value));
            }
        }
    }

    fn payload(&self, ty: &Type) -> Payload {
        match ty {
            Type::Primitive { kind, .. } => match kind {
                PrimitiveKind::Float => Payload::Float,
                PrimitiveKind::Double => Payload::Double,
                PrimitiveKind::Bool => Payload::Bool,
                PrimitiveKind::String => Payload::Str,
                PrimitiveKind::Byte => Payload::Byte,
                _ => Payload::Varint,
            },
            Type::UserRef { name, .. } => {
                if self.schema.find_enum(name).is_some() {
                    Payload::Enum
                } else {
                    Payload::Message(name.clone())
                }
            }
        }
    }

    fn wire_type(&self, field: &Field) -> WireType {
        if field.modifiers.is_packed() {
            return WireType::PackedArray;
        }
        if field.modifiers.is_bitmap() {
            return WireType::Bitmap;
        }

        match &field.ty {
            Type::Primitive { kind, .. } => {
                if field.modifiers.is_interned() && *kind == PrimitiveKind::String {
                    return WireType::StringTable;
                }
                match kind {
                    PrimitiveKind::Double => WireType::Fixed64,
                    PrimitiveKind::Float => WireType::Fixed32,
                    PrimitiveKind::String | PrimitiveKind::Byte => WireType::LengthDelimited,
                    _ => WireType::Varint,
                }
            }
            Type::UserRef { .. } => WireType::LengthDelimited,
        }
    }

    fn cpp_type(&self, ty: &Type) -> String {
        match ty {
            Type::Primitive { kind, .. } => match kind {
                PrimitiveKind::Int8 => "int8_t",
                PrimitiveKind::Int16 => "int16_t",
                PrimitiveKind::Int32 => "int32_t",
                PrimitiveKind::Int64 => "int64_t",
                PrimitiveKind::UInt8 => "uint8_t",
                PrimitiveKind::UInt16 => "uint16_t",
                PrimitiveKind::UInt32 => "uint32_t",
                PrimitiveKind::UInt64 => "uint64_t",
                PrimitiveKind::Float => "float",
                PrimitiveKind::Double => "double",
                PrimitiveKind::Bool => "bool",
                PrimitiveKind::String => "std::string",
                PrimitiveKind::Byte => "uint8_t",
            }
            .to_string(),
            Type::UserRef { name, .. } => name.clone(),
        }
    }

    fn field_type(&self, field: &Field) -> String {
        let base = self.cpp_type(&field.ty);

        if field.modifiers.is_repeated() {
            format!("std::vector<{}>", base)
        } else if field.modifiers.is_optional() {
            format!("std::optional<{}>", base)
        } else {
            base
        }
    }

    fn default_initializer(&self, field: &Field) -> &'static str {
        if field.modifiers.is_repeated() || field.modifiers.is_optional() {
            return "";
        }

        match &field.ty {
            Type::Primitive { kind, .. } => match kind {
                PrimitiveKind::Bool => " = false",
                PrimitiveKind::String => "",
                _ => " = 0",
            },
            Type::UserRef { .. } => "",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;
    use crate::validator::validate_schema;

    fn schema(source: &str) -> Schema {
        let schema = Parser::new(Lexer::new(source))
            .parse_schema()
            .expect("schema should parse");
        assert_eq!(validate_schema(&schema), vec![]);
        schema
    }

    fn header(source: &str) -> String {
        let schema = schema(source);
        Emitter::new(&schema).generate_header()
    }

    fn body(source: &str) -> String {
        let schema = schema(source);
        Emitter::new(&schema).generate_source()
    }

    #[test]
    fn header_declares_a_simple_enum() {
        let header = header(
            "namespace test;
             enum Status {
               OK = 0;
               ERROR = 1;
             }",
        );
        assert!(header.starts_with("#pragma once\n"));
        assert!(header.contains("namespace test {"));
        assert!(header.contains("enum class Status : int32_t {"));
        assert!(header.contains("  OK = 0,\n"));
        assert!(header.contains("  ERROR = 1\n"));
        assert!(header.ends_with("} // namespace test\n"));
    }

    #[test]
    fn header_declares_a_simple_model() {
        let header = header("namespace test; model User { string name = 1; int32 age = 2; }");
        assert!(header.contains("class User {"));
        assert!(header.contains("  User() = default;\n"));
        assert!(header.contains("  std::string name;\n"));
        assert!(header.contains("  int32_t age = 0;\n"));
        assert!(header.contains("  std::vector<uint8_t> serialize() const;\n"));
        assert!(header.contains("  bool deserialize(const std::vector<uint8_t>& data);\n"));
    }

    #[test]
    fn header_maps_every_primitive_type() {
        let header = header(
            "namespace test;
             model All {
               int8 a = 1; int16 b = 2; int32 c = 3; int64 d = 4;
               uint8 e = 5; uint16 f = 6; uint32 g = 7; uint64 h = 8;
               float i = 9; double j = 10; bool k = 11; string l = 12;
               byte m = 13;
             }",
        );
        assert!(header.contains("int8_t a = 0;"));
        assert!(header.contains("int16_t b = 0;"));
        assert!(header.contains("int32_t c = 0;"));
        assert!(header.contains("int64_t d = 0;"));
        assert!(header.contains("uint8_t e = 0;"));
        assert!(header.contains("uint16_t f = 0;"));
        assert!(header.contains("uint32_t g = 0;"));
        assert!(header.contains("uint64_t h = 0;"));
        assert!(header.contains("float i = 0;"));
        assert!(header.contains("double j = 0;"));
        assert!(header.contains("bool k = false;"));
        assert!(header.contains("std::string l;"));
        assert!(header.contains("uint8_t m = 0;"));
    }

    #[test]
    fn header_wraps_optional_and_repeated_members() {
        let header = header(
            "namespace test;
             model Profile {
               optional string bio = 1;
               optional int32 rating = 2;
               repeated string tags = 3;
               repeated int32 numbers = 4;
             }",
        );
        assert!(header.contains("std::optional<std::string> bio;"));
        assert!(header.contains("std::optional<int32_t> rating;"));
        assert!(header.contains("std::vector<std::string> tags;"));
        assert!(header.contains("std::vector<int32_t> numbers;"));
    }

    #[test]
    fn header_declares_user_typed_members_without_initializers() {
        let header = header(
            "namespace test;
             enum Role { GUEST = 0; ADMIN = 1; }
             model Account { Role role = 1; Address address = 2; }
             model Address { string city = 1; }",
        );
        assert!(header.contains("  Role role;\n"));
        assert!(header.contains("  Address address;\n"));
    }

    #[test]
    fn header_emits_a_dotted_namespace_literally() {
        let header = header("namespace com.example.auth; model M { bool ok = 1; }");
        assert!(header.contains("namespace com.example.auth {"));
        assert!(header.contains("} // namespace com.example.auth"));
    }

    #[test]
    fn body_includes_the_header_and_helpers() {
        let body = body("namespace test; model Simple { uint32 id = 1; }");
        assert!(body.starts_with("#include \"test.hpp\"\n#include <cstring>\n"));
        assert!(body.contains("inline void write_varint(std::vector<uint8_t>& buffer"));
        assert!(body.contains("inline bool read_varint(const std::vector<uint8_t>& data"));
        assert!(body.contains("inline bool skip_field(const std::vector<uint8_t>& data"));
    }

    #[test]
    fn body_respects_a_base_name_override() {
        let schema = schema("namespace test; model Simple { uint32 id = 1; }");
        let body = Emitter::with_base_name(&schema, "custom").generate_source();
        assert!(body.starts_with("#include \"custom.hpp\"\n"));
    }

    #[test]
    fn serialize_method_shape() {
        let body = body("namespace test; model Simple { uint32 id = 1; }");
        assert!(body.contains("std::vector<uint8_t> Simple::serialize() const {"));
        assert!(body.contains("  buffer.reserve(64);\n"));
        assert!(body.contains("  return buffer;\n"));
        // Tag for field 1, wire type 0.
        assert!(body.contains("write_varint(buffer, 8);"));
        assert!(body.contains("write_varint(buffer, static_cast<uint64_t>(id));"));
    }

    #[test]
    fn deserialize_method_shape() {
        let body = body("namespace test; model Simple { uint32 id = 1; }");
        assert!(body.contains("bool Simple::deserialize(const std::vector<uint8_t>& data) {"));
        assert!(body.contains("uint32_t field_number = static_cast<uint32_t>(tag >> 3);"));
        assert!(body.contains("uint8_t wire_type = static_cast<uint8_t>(tag & 0x7);"));
        assert!(body.contains("switch (field_number) {"));
        assert!(body.contains("    case 1: {\n"));
        assert!(body.contains("id = static_cast<uint32_t>(raw);"));
        assert!(body.contains("if (!skip_field(data, pos, wire_type)) {"));
        assert!(body.contains("  return true;\n}"));
    }

    #[test]
    fn string_fields_use_length_delimited_tags() {
        let body = body("namespace test; model M { string s = 2; }");
        // Tag (2 << 3) | 2.
        assert!(body.contains("write_varint(buffer, 18);"));
        assert!(body.contains("write_varint(buffer, s.size());"));
        assert!(body.contains("buffer.insert(buffer.end(), s.begin(), s.end());"));
        assert!(body.contains("std::string value(reinterpret_cast<const char*>(data.data() + pos)"));
        assert!(body.contains("s = std::move(value);"));
    }

    #[test]
    fn packed_fields_use_a_single_length_delimited_record() {
        let body = body("namespace test; model M { packed repeated uint32 xs = 3; }");
        // Tag (3 << 3) | 2, even though the field's wire type is 3.
        assert!(body.contains("write_varint(buffer, 26);"));
        assert!(body.contains("std::vector<uint8_t> packed;"));
        assert!(body.contains("write_varint(buffer, packed.size());"));
        assert!(body.contains("write_varint(packed, static_cast<uint64_t>(item));"));
        // Decode walks the payload element-wise and rejects overruns.
        assert!(body.contains("size_t end = pos + static_cast<size_t>(length);"));
        assert!(body.contains("while (pos < end) {"));
        assert!(body.contains("if (pos != end) {"));
        assert!(body.contains("xs.push_back(static_cast<uint32_t>(raw));"));
    }

    #[test]
    fn repeated_fields_emit_one_tag_per_element() {
        let body = body("namespace test; model M { repeated string tags = 4; }");
        assert!(body.contains("if (!tags.empty()) {"));
        assert!(body.contains("for (const auto& item : tags) {"));
        // Tag (4 << 3) | 2.
        assert!(body.contains("write_varint(buffer, 34);"));
        assert!(body.contains("tags.push_back(std::move(value));"));
    }

    #[test]
    fn optional_fields_serialize_only_when_present() {
        let body = body("namespace test; model M { optional uint32 id = 5; }");
        assert!(body.contains("if (id.has_value()) {"));
        assert!(body.contains("write_varint(buffer, static_cast<uint64_t>((*id)));"));
        assert!(body.contains("id = static_cast<uint32_t>(raw);"));
    }

    #[test]
    fn float_and_double_use_fixed_width_payloads() {
        let body = body("namespace test; model M { float x = 1; double y = 2; }");
        // Tags (1 << 3) | 5 and (2 << 3) | 1.
        assert!(body.contains("write_varint(buffer, 13);"));
        assert!(body.contains("write_varint(buffer, 17);"));
        assert!(body.contains("std::memcpy(&bits, &fval, sizeof(float));"));
        assert!(body.contains("write_fixed32(buffer, bits);"));
        assert!(body.contains("std::memcpy(&bits, &dval, sizeof(double));"));
        assert!(body.contains("write_fixed64(buffer, bits);"));
        assert!(body.contains("if (!read_fixed32(data, pos, bits)) {"));
        assert!(body.contains("if (!read_fixed64(data, pos, bits)) {"));
    }

    #[test]
    fn bool_fields_emit_single_byte_payloads() {
        let body = body("namespace test; model M { bool ok = 1; }");
        assert!(body.contains("buffer.push_back(ok ? 1 : 0);"));
        assert!(body.contains("ok = (raw != 0);"));
    }

    #[test]
    fn byte_fields_are_length_delimited() {
        let body = body("namespace test; model M { byte b = 1; }");
        // Tag (1 << 3) | 2.
        assert!(body.contains("write_varint(buffer, 10);"));
        assert!(body.contains("write_varint(buffer, 1);"));
        assert!(body.contains("buffer.push_back(b);"));
        assert!(body.contains("uint8_t value = item_length > 0 ? data[pos] : 0;"));
    }

    #[test]
    fn bitmap_and_interned_wire_types_are_carried_in_tags() {
        let body = body(
            "namespace test;
             model M {
               repeated bitmap bool flags = 7;
               interned string locale = 8;
             }",
        );
        // Tags (7 << 3) | 7 and (8 << 3) | 6.
        assert!(body.contains("write_varint(buffer, 63);"));
        assert!(body.contains("write_varint(buffer, 70);"));
        assert!(body.contains("flags.push_back((raw != 0));"));
    }

    #[test]
    fn enums_serialize_as_varint_ordinals_with_user_type_tags() {
        let body = body(
            "namespace test;
             enum Role { GUEST = 0; ADMIN = 1; }
             model M { Role role = 2; }",
        );
        // Tag (2 << 3) | 2: user types keep wire code 2.
        assert!(body.contains("write_varint(buffer, 18);"));
        assert!(body.contains("write_varint(buffer, static_cast<uint64_t>(role));"));
        assert!(body.contains("role = static_cast<Role>(raw);"));
    }

    #[test]
    fn nested_models_round_trip_through_length_delimited_slices() {
        let body = body(
            "namespace test;
             model Outer { Inner one = 1; repeated Inner many = 2; optional Inner maybe = 3; }
             model Inner { int32 x = 1; }",
        );
        assert!(body.contains("std::vector<uint8_t> nested = one.serialize();"));
        assert!(body.contains("std::vector<uint8_t> nested = (*maybe).serialize();"));
        assert!(body.contains("Inner value;"));
        assert!(body.contains("if (!value.deserialize(nested)) {"));
        assert!(body.contains("many.push_back(std::move(value));"));
        assert!(body.contains("one = std::move(value);"));
        // Enums have no body; only models define methods.
        assert!(!body.contains("Inner::Inner"));
    }

    #[test]
    fn output_is_deterministic() {
        let source = "namespace test;
             enum Role { GUEST = 0; ADMIN = 1; }
             model User {
               string name = 1;
               optional Role role = 2;
               packed repeated double samples = 3;
             }";
        let schema = schema(source);
        let emitter = Emitter::new(&schema);
        assert_eq!(emitter.generate_header(), emitter.generate_header());
        assert_eq!(emitter.generate_source(), emitter.generate_source());
    }

    #[test]
    fn declarations_keep_source_order() {
        let header = header(
            "namespace test;
             model Zeta { int32 z = 1; }
             enum Alpha { A = 0; }
             model Beta { int32 b = 1; }",
        );
        let zeta = header.find("class Zeta").expect("Zeta");
        let alpha = header.find("enum class Alpha").expect("Alpha");
        let beta = header.find("class Beta").expect("Beta");
        assert!(zeta < alpha && alpha < beta);
    }
}
