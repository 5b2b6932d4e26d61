// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

extern crate proc_macro;

use proc_macro::TokenStream;
use quote::quote;
use syn::{
    parse_macro_input, Attribute, Data, DeriveInput, Expr, ExprLit, Fields, Lit, LitStr, Meta,
    Visibility,
};

/// Annotation attached to one field, keyed by annotation key (`csv`, `db`, ...).
struct FieldTag {
    key: String,
    value: LitStr,
}

/// Per-field information collected from the struct definition.
struct FieldInfo {
    ident: syn::Ident,
    ty: syn::Type,
    exported: bool,
    tags: Vec<FieldTag>,
}

/// `#[derive(Record)]` macro: generates the static `Shape` + field accessors
///
/// Every named field is described in declaration order. Fields are annotated
/// with the default `csv` key or with any key through `#[rowmap(...)]`:
///
/// ```ignore
/// use rowmap::Record;
///
/// #[derive(Record, Default)]
/// pub struct User {
///     #[csv = "name"]
///     pub name: String,
///     #[csv = "age,omitempty"]
///     pub age: u32,
///     #[rowmap(csv = "home_,inline", db = "-")]
///     pub home: Address,
///     #[csv = "-"]
///     pub cache: Vec<u8>,
/// }
/// ```
///
/// Only `pub` fields take part in the schema. Every field type must implement
/// `rowmap::Value`.
///
/// # Errors
///
/// Emits a compile error for enums, tuple structs, generic structs and for a
/// field annotating the same key twice.
#[proc_macro_derive(Record, attributes(csv, rowmap))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match expand_record(&input) {
        Ok(tokens) => TokenStream::from(tokens),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand_record(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let type_name = name.to_string();
    reject_generics(input)?;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(f) => &f.named,
            Fields::Unit => {
                return Err(syn::Error::new_spanned(
                    input,
                    "Record requires named fields; unit structs have no columns",
                ))
            }
            Fields::Unnamed(_) => {
                return Err(syn::Error::new_spanned(
                    input,
                    "Only named fields are supported",
                ))
            }
        },
        _ => return Err(syn::Error::new_spanned(input, "Only structs are supported")),
    };

    let mut infos = Vec::with_capacity(fields.len());
    for field in fields {
        let Some(ident) = field.ident.clone() else {
            return Err(syn::Error::new_spanned(field, "Field must have a name"));
        };
        infos.push(FieldInfo {
            ident,
            ty: field.ty.clone(),
            exported: matches!(field.vis, Visibility::Public(_)),
            tags: parse_field_tags(&field.attrs)?,
        });
    }

    let field_shapes: Vec<_> = infos
        .iter()
        .enumerate()
        .map(|(index, f)| {
            let name_str = f.ident.to_string();
            let ty = &f.ty;
            let exported = f.exported;
            let tags: Vec<_> = f
                .tags
                .iter()
                .map(|t| {
                    let key = &t.key;
                    let value = &t.value;
                    quote! { (#key, #value) }
                })
                .collect();

            quote! {
                ::rowmap::schema::FieldShape {
                    name: #name_str,
                    index: #index,
                    exported: #exported,
                    tags: &[#(#tags),*],
                    ty: <#ty as ::rowmap::Value>::type_info,
                }
            }
        })
        .collect();

    let indices: Vec<_> = (0..infos.len()).collect();
    let idents: Vec<_> = infos.iter().map(|f| &f.ident).collect();

    Ok(quote! {
        impl ::rowmap::Record for #name {
            fn shape() -> &'static ::rowmap::schema::Shape {
                static SHAPE: ::rowmap::schema::Shape = ::rowmap::schema::Shape {
                    name: #type_name,
                    fields: &[#(#field_shapes),*],
                };
                &SHAPE
            }

            fn field(&self, index: usize) -> ::core::option::Option<&dyn ::rowmap::Value> {
                match index {
                    #(#indices => ::core::option::Option::Some(&self.#idents),)*
                    _ => ::core::option::Option::None,
                }
            }

            fn field_mut(
                &mut self,
                index: usize,
            ) -> ::core::option::Option<&mut dyn ::rowmap::Value> {
                match index {
                    #(#indices => ::core::option::Option::Some(&mut self.#idents),)*
                    _ => ::core::option::Option::None,
                }
            }
        }

        impl ::rowmap::Value for #name {
            fn type_info() -> ::rowmap::schema::TypeInfo {
                ::rowmap::schema::TypeInfo::record::<Self>()
            }

            fn as_record(&self) -> ::core::option::Option<&dyn ::rowmap::Record> {
                ::core::option::Option::Some(self)
            }

            fn as_record_mut(&mut self) -> ::core::option::Option<&mut dyn ::rowmap::Record> {
                ::core::option::Option::Some(self)
            }
        }
    })
}

/// Collect `#[csv = "..."]` and `#[rowmap(key = "...")]` annotations of a field.
fn parse_field_tags(attrs: &[Attribute]) -> syn::Result<Vec<FieldTag>> {
    let mut tags: Vec<FieldTag> = Vec::new();

    for attr in attrs {
        if attr.path().is_ident("csv") {
            let Meta::NameValue(nv) = &attr.meta else {
                return Err(syn::Error::new_spanned(
                    attr,
                    "expected #[csv = \"name,options\"]",
                ));
            };
            let Expr::Lit(ExprLit {
                lit: Lit::Str(value),
                ..
            }) = &nv.value
            else {
                return Err(syn::Error::new_spanned(
                    &nv.value,
                    "csv annotation must be a string literal",
                ));
            };
            push_tag(&mut tags, "csv".to_string(), value.clone(), attr)?;
        } else if attr.path().is_ident("rowmap") {
            attr.parse_nested_meta(|meta| {
                let Some(key) = meta.path.get_ident().map(ToString::to_string) else {
                    return Err(meta.error("annotation key must be an identifier"));
                };
                let value: LitStr = meta.value()?.parse()?;
                push_tag(&mut tags, key, value, attr)
            })?;
        }
    }

    Ok(tags)
}

fn push_tag(
    tags: &mut Vec<FieldTag>,
    key: String,
    value: LitStr,
    attr: &Attribute,
) -> syn::Result<()> {
    if tags.iter().any(|t| t.key == key) {
        return Err(syn::Error::new_spanned(
            attr,
            format!("annotation key `{key}` given more than once"),
        ));
    }
    tags.push(FieldTag { key, value });
    Ok(())
}

/// Capabilities a `#[derive(Value)]` type forwards to its trait impls.
#[derive(Default)]
struct ValueOptions {
    marshal_csv: bool,
    unmarshal_csv: bool,
    marshal_text: bool,
    unmarshal_text: bool,
    zero: bool,
}

/// `#[derive(Value)]` macro: makes a user type usable as a record field
///
/// The container attribute selects which capability traits the type
/// implements and the runtime should call:
///
/// - `csv`: `rowmap::Marshaler` + `rowmap::Unmarshaler`
/// - `text`: `rowmap::TextMarshaler` + `rowmap::TextUnmarshaler`
/// - `marshal_csv`, `unmarshal_csv`, `marshal_text`, `unmarshal_text`: one direction only
/// - `zero`: `omitempty` compares against `Default::default()` (needs `PartialEq`)
///
/// The type must implement `Default`. A type without any capability is only
/// convertible through registered functions.
///
/// ```ignore
/// #[derive(rowmap::Value, Default, PartialEq)]
/// #[value(marshal_csv, zero)]
/// pub enum Status { #[default] Unknown, Success, Failure }
/// ```
#[proc_macro_derive(Value, attributes(value))]
pub fn derive_value(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match expand_value(&input) {
        Ok(tokens) => TokenStream::from(tokens),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand_value(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    reject_generics(input)?;

    let mut opts = ValueOptions::default();
    for attr in &input.attrs {
        if !attr.path().is_ident("value") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("csv") {
                opts.marshal_csv = true;
                opts.unmarshal_csv = true;
            } else if meta.path.is_ident("text") {
                opts.marshal_text = true;
                opts.unmarshal_text = true;
            } else if meta.path.is_ident("marshal_csv") {
                opts.marshal_csv = true;
            } else if meta.path.is_ident("unmarshal_csv") {
                opts.unmarshal_csv = true;
            } else if meta.path.is_ident("marshal_text") {
                opts.marshal_text = true;
            } else if meta.path.is_ident("unmarshal_text") {
                opts.unmarshal_text = true;
            } else if meta.path.is_ident("zero") {
                opts.zero = true;
            } else {
                return Err(meta.error(
                    "expected one of: csv, text, marshal_csv, unmarshal_csv, marshal_text, unmarshal_text, zero",
                ));
            }
            Ok(())
        })?;
    }

    let is_zero = opts.zero.then(|| {
        quote! {
            fn is_zero(&self) -> bool {
                *self == <Self as ::core::default::Default>::default()
            }
        }
    });
    let marshal_csv = opts.marshal_csv.then(|| {
        quote! {
            fn marshal_csv(
                &self,
            ) -> ::core::option::Option<::core::result::Result<::std::vec::Vec<u8>, ::rowmap::BoxError>> {
                ::core::option::Option::Some(::rowmap::Marshaler::marshal_csv(self))
            }
        }
    });
    let unmarshal_csv = opts.unmarshal_csv.then(|| {
        quote! {
            fn unmarshal_csv(
                &mut self,
                data: &[u8],
            ) -> ::core::option::Option<::core::result::Result<(), ::rowmap::BoxError>> {
                ::core::option::Option::Some(::rowmap::Unmarshaler::unmarshal_csv(self, data))
            }
        }
    });
    let marshal_text = opts.marshal_text.then(|| {
        quote! {
            fn marshal_text(
                &self,
            ) -> ::core::option::Option<::core::result::Result<::std::string::String, ::rowmap::BoxError>> {
                ::core::option::Option::Some(::rowmap::TextMarshaler::marshal_text(self))
            }
        }
    });
    let unmarshal_text = opts.unmarshal_text.then(|| {
        quote! {
            fn unmarshal_text(
                &mut self,
                text: &str,
            ) -> ::core::option::Option<::core::result::Result<(), ::rowmap::BoxError>> {
                ::core::option::Option::Some(::rowmap::TextUnmarshaler::unmarshal_text(self, text))
            }
        }
    });

    Ok(quote! {
        impl ::rowmap::Value for #name {
            fn type_info() -> ::rowmap::schema::TypeInfo {
                ::rowmap::schema::TypeInfo::new::<Self>(::rowmap::schema::Kind::Custom)
            }

            #is_zero
            #marshal_csv
            #unmarshal_csv
            #marshal_text
            #unmarshal_text
        }
    })
}

fn reject_generics(input: &DeriveInput) -> syn::Result<()> {
    if input.generics.params.is_empty() {
        Ok(())
    } else {
        Err(syn::Error::new_spanned(
            &input.generics,
            "generic types are not supported; describe a concrete type",
        ))
    }
}
