//! Proc macros for narrator tool declarations.
//!
//! Provides `#[derive(Tool)]`, which turns a documented input struct into a
//! `claude::Tool` declaration with a JSON schema and a typed parser for the
//! arguments the model sends back.
//!
//! # Example
//!
//! ```ignore
//! /// Saves a structured entry to the game log.
//! #[derive(Tool, Deserialize)]
//! #[tool(name = "update_game_log")]
//! struct UpdateGameLog {
//!     /// What happened, in one sentence
//!     new_entry: String,
//!     /// Kind of entry
//!     #[tool(one_of = "event, discovery, decision", default = "event")]
//!     #[serde(default = "default_category")]
//!     category: String,
//! }
//! ```
//!
//! # Attributes
//!
//! - `#[tool(name = "...")]` on the struct: tool name (defaults to the snake_case struct name)
//! - `#[tool(rename = "...")]` on a field: property name in the schema
//! - `#[tool(optional)]` on a field: not listed in `required`
//! - `#[tool(one_of = "a, b, c")]` on a field: emits a string `enum`
//! - `#[tool(default = "...")]` on a field: emits `default` and implies `optional`
//!
//! `default` only documents the value for the model; the struct still needs a
//! matching `#[serde(default)]` for the generated `from_input` to accept a
//! missing field.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, Attribute, DeriveInput, Expr, Field, Lit, LitStr, Meta, Type};

/// Derive macro for generating tool declarations.
#[proc_macro_derive(Tool, attributes(tool))]
pub fn derive_tool(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_tool(input)
        .unwrap_or_else(|err| err.to_compile_error())
        .into()
}

/// Field-level `#[tool(...)]` settings.
#[derive(Default)]
struct FieldOptions {
    rename: Option<String>,
    optional: bool,
    one_of: Vec<String>,
    default: Option<String>,
}

fn expand_tool(input: DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;
    let tool_name = get_tool_name(&input)?;
    let description = get_doc_comment(&input.attrs);

    let fields = match &input.data {
        syn::Data::Struct(data) => match &data.fields {
            syn::Fields::Named(named) => &named.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "Tool derive only supports structs with named fields",
                ))
            }
        },
        _ => return Err(syn::Error::new_spanned(&input, "Tool derive only supports structs")),
    };

    let mut property_tokens = Vec::new();
    let mut required_fields = Vec::new();

    for field in fields {
        let options = field_options(field)?;
        let field_name = match &options.rename {
            Some(name) => name.clone(),
            None => field_ident_name(field)?,
        };
        let field_desc = get_doc_comment(&field.attrs);
        let type_schema = type_to_schema(&field.ty);

        let desc_token = if field_desc.is_empty() {
            quote! {}
        } else {
            quote! { property["description"] = serde_json::json!(#field_desc); }
        };

        let enum_token = if options.one_of.is_empty() {
            quote! {}
        } else {
            let values = &options.one_of;
            quote! { property["enum"] = serde_json::json!([#(#values),*]); }
        };

        let default_token = match &options.default {
            Some(value) => quote! { property["default"] = serde_json::json!(#value); },
            None => quote! {},
        };

        property_tokens.push(quote! {
            {
                let mut property = #type_schema;
                #desc_token
                #enum_token
                #default_token
                properties.insert(#field_name.to_string(), property);
            }
        });

        let optional = options.optional || options.default.is_some() || is_option_type(&field.ty);
        if !optional {
            required_fields.push(field_name);
        }
    }

    Ok(quote! {
        impl #struct_name {
            /// Get the tool name.
            pub fn tool_name() -> &'static str {
                #tool_name
            }

            /// Get the tool description.
            pub fn tool_description() -> &'static str {
                #description
            }

            /// Generate the JSON schema for this tool's input.
            pub fn input_schema() -> serde_json::Value {
                let mut properties = serde_json::Map::new();
                #(#property_tokens)*

                let required: Vec<&str> = vec![#(#required_fields),*];

                serde_json::json!({
                    "type": "object",
                    "properties": properties,
                    "required": required
                })
            }

            /// Create a Tool declaration for the agent runtime.
            pub fn as_tool() -> claude::Tool {
                claude::Tool {
                    name: Self::tool_name().to_string(),
                    description: Self::tool_description().to_string(),
                    input_schema: Self::input_schema(),
                }
            }

            /// Parse the arguments of a tool call.
            pub fn from_input(input: &serde_json::Value) -> Result<Self, serde_json::Error>
            where
                Self: serde::de::DeserializeOwned,
            {
                serde_json::from_value(input.clone())
            }
        }
    })
}

fn get_tool_name(input: &DeriveInput) -> syn::Result<String> {
    let mut name = None;
    for attr in input.attrs.iter().filter(|a| a.path().is_ident("tool")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                let value: LitStr = meta.value()?.parse()?;
                name = Some(value.value());
                Ok(())
            } else {
                Err(meta.error("expected `name = \"...\"`"))
            }
        })?;
    }

    Ok(name.unwrap_or_else(|| to_snake_case(&input.ident.to_string())))
}

fn field_options(field: &Field) -> syn::Result<FieldOptions> {
    let mut options = FieldOptions::default();
    for attr in field.attrs.iter().filter(|a| a.path().is_ident("tool")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("optional") {
                options.optional = true;
            } else if meta.path.is_ident("rename") {
                let value: LitStr = meta.value()?.parse()?;
                options.rename = Some(value.value());
            } else if meta.path.is_ident("default") {
                let value: LitStr = meta.value()?.parse()?;
                options.default = Some(value.value());
            } else if meta.path.is_ident("one_of") {
                let value: LitStr = meta.value()?.parse()?;
                options.one_of = value
                    .value()
                    .split(',')
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty())
                    .collect();
                if options.one_of.is_empty() {
                    return Err(meta.error("`one_of` needs at least one value"));
                }
            } else {
                return Err(meta.error("unknown tool field attribute"));
            }
            Ok(())
        })?;
    }

    if let (Some(default), false) = (&options.default, options.one_of.is_empty()) {
        if !options.one_of.contains(default) {
            return Err(syn::Error::new_spanned(
                field,
                format!("default `{default}` is not one of the allowed values"),
            ));
        }
    }

    Ok(options)
}

fn field_ident_name(field: &Field) -> syn::Result<String> {
    field
        .ident
        .as_ref()
        .map(|ident| ident.to_string().trim_start_matches("r#").to_string())
        .ok_or_else(|| syn::Error::new_spanned(field, "expected a named field"))
}

fn get_doc_comment(attrs: &[Attribute]) -> String {
    let mut docs = Vec::new();
    for attr in attrs {
        if attr.path().is_ident("doc") {
            if let Meta::NameValue(nv) = &attr.meta {
                if let Expr::Lit(expr_lit) = &nv.value {
                    if let Lit::Str(s) = &expr_lit.lit {
                        let line = s.value();
                        let line = line.trim();
                        if !line.is_empty() {
                            docs.push(line.to_string());
                        }
                    }
                }
            }
        }
    }
    docs.join(" ")
}

fn is_option_type(ty: &Type) -> bool {
    if let Type::Path(type_path) = ty {
        if let Some(segment) = type_path.path.segments.last() {
            return segment.ident == "Option";
        }
    }
    false
}

fn type_to_schema(ty: &Type) -> TokenStream2 {
    let Type::Path(type_path) = ty else {
        return quote! { serde_json::json!({}) };
    };
    let Some(segment) = type_path.path.segments.last() else {
        return quote! { serde_json::json!({}) };
    };

    let inner = match &segment.arguments {
        syn::PathArguments::AngleBracketed(args) => args.args.iter().find_map(|arg| match arg {
            syn::GenericArgument::Type(inner) => Some(inner),
            _ => None,
        }),
        _ => None,
    };

    match segment.ident.to_string().as_str() {
        "String" | "str" => quote! { serde_json::json!({"type": "string"}) },
        "i8" | "i16" | "i32" | "i64" | "isize" | "u8" | "u16" | "u32" | "u64" | "usize" => {
            quote! { serde_json::json!({"type": "integer"}) }
        }
        "f32" | "f64" => quote! { serde_json::json!({"type": "number"}) },
        "bool" => quote! { serde_json::json!({"type": "boolean"}) },
        "Option" => match inner {
            Some(inner) => type_to_schema(inner),
            None => quote! { serde_json::json!({}) },
        },
        "Vec" => match inner {
            Some(inner) => {
                let inner_schema = type_to_schema(inner);
                quote! { serde_json::json!({"type": "array", "items": #inner_schema}) }
            }
            None => quote! { serde_json::json!({"type": "array"}) },
        },
        _ => quote! { serde_json::json!({"type": "object"}) },
    }
}

fn to_snake_case(s: &str) -> String {
    let mut result = String::new();
    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                result.push('_');
            }
            result.push(c.to_ascii_lowercase());
        } else {
            result.push(c);
        }
    }
    result
}
