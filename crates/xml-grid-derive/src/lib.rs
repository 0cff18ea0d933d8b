/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! `#[derive(GridRow)]`: compile-time binding shapes for xml-grid.
//!
//! Named-field structs are property-bound: each field is a member bound
//! by column name, and the struct must implement `Default`. Tuple structs,
//! and structs marked `#[grid(positional)]` or `#[grid(constructor = "..")]`,
//! are constructor-bound: columns are taken in document order, one per
//! field.
//!
//! Container attributes: `positional`, `constructor = "path"`,
//! `rename_all = "PascalCase" | "camelCase" | "snake_case" | "lowercase" | "UPPERCASE"`.
//! Field attributes: `rename = "Name"`, `required`, `skip`.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::ext::IdentExt;
use syn::spanned::Spanned;
use syn::{Data, DeriveInput, Field, Fields, LitStr, Path, Type, parse_macro_input};

#[proc_macro_derive(GridRow, attributes(grid))]
pub fn derive_grid_row(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RenameRule {
    PascalCase,
    CamelCase,
    SnakeCase,
    Lowercase,
    Uppercase,
}

impl RenameRule {
    fn parse(rule: &str) -> Option<Self> {
        match rule {
            "PascalCase" => Some(RenameRule::PascalCase),
            "camelCase" => Some(RenameRule::CamelCase),
            "snake_case" => Some(RenameRule::SnakeCase),
            "lowercase" => Some(RenameRule::Lowercase),
            "UPPERCASE" => Some(RenameRule::Uppercase),
            _ => None,
        }
    }

    /// Apply to a snake_case field name.
    fn apply(self, field: &str) -> String {
        match self {
            RenameRule::SnakeCase => field.to_string(),
            RenameRule::Lowercase => field.to_ascii_lowercase(),
            RenameRule::Uppercase => field.to_ascii_uppercase(),
            RenameRule::PascalCase => field.split('_').map(capitalize).collect(),
            RenameRule::CamelCase => {
                let pascal = RenameRule::PascalCase.apply(field);
                let mut chars = pascal.chars();
                match chars.next() {
                    Some(first) => first.to_lowercase().chain(chars).collect(),
                    None => pascal,
                }
            }
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[derive(Default)]
struct ContainerAttrs {
    positional: bool,
    constructor: Option<Path>,
    rename_all: Option<RenameRule>,
}

impl ContainerAttrs {
    fn parse(input: &DeriveInput) -> syn::Result<Self> {
        let mut attrs = ContainerAttrs::default();
        for attr in input.attrs.iter().filter(|a| a.path().is_ident("grid")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("positional") {
                    attrs.positional = true;
                    Ok(())
                } else if meta.path.is_ident("constructor") {
                    let path: LitStr = meta.value()?.parse()?;
                    attrs.constructor = Some(path.parse()?);
                    Ok(())
                } else if meta.path.is_ident("rename_all") {
                    let rule: LitStr = meta.value()?.parse()?;
                    attrs.rename_all = Some(RenameRule::parse(&rule.value()).ok_or_else(|| {
                        syn::Error::new(
                            rule.span(),
                            "unknown rename rule, expected one of \"PascalCase\", \"camelCase\", \
                             \"snake_case\", \"lowercase\", \"UPPERCASE\"",
                        )
                    })?);
                    Ok(())
                } else {
                    Err(meta.error("unknown grid container attribute"))
                }
            })?;
        }
        Ok(attrs)
    }
}

#[derive(Default)]
struct FieldAttrs {
    rename: Option<String>,
    required: Option<proc_macro2::Span>,
    skip: Option<proc_macro2::Span>,
}

impl FieldAttrs {
    fn parse(field: &Field) -> syn::Result<Self> {
        let mut attrs = FieldAttrs::default();
        for attr in field.attrs.iter().filter(|a| a.path().is_ident("grid")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename") {
                    let name: LitStr = meta.value()?.parse()?;
                    if name.value().is_empty() {
                        return Err(syn::Error::new(name.span(), "column name cannot be empty"));
                    }
                    attrs.rename = Some(name.value());
                    Ok(())
                } else if meta.path.is_ident("required") {
                    attrs.required = Some(meta.path.span());
                    Ok(())
                } else if meta.path.is_ident("skip") {
                    attrs.skip = Some(meta.path.span());
                    Ok(())
                } else {
                    Err(meta.error("unknown grid field attribute"))
                }
            })?;
        }
        if let (Some(_), Some(skip)) = (attrs.required, attrs.skip) {
            return Err(syn::Error::new(skip, "a skipped field cannot be required"));
        }
        Ok(attrs)
    }
}

/// One field, resolved to the column or parameter name it binds from.
struct BoundField<'a> {
    field: &'a Field,
    index: usize,
    column: String,
    attrs: FieldAttrs,
}

impl BoundField<'_> {
    fn ty(&self) -> &Type {
        &self.field.ty
    }
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let data = match &input.data {
        Data::Struct(data) => data,
        Data::Enum(data) => {
            return Err(syn::Error::new(
                data.enum_token.span,
                "GridRow can only be derived for structs",
            ));
        }
        Data::Union(data) => {
            return Err(syn::Error::new(
                data.union_token.span,
                "GridRow can only be derived for structs",
            ));
        }
    };

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new(
            input.generics.span(),
            "GridRow cannot be derived for generic structs",
        ));
    }

    let container = ContainerAttrs::parse(input)?;
    let fields = bind_fields(&data.fields, &container)?;

    let name = &input.ident;
    let shape = match &data.fields {
        Fields::Unit => {
            return Err(syn::Error::new(
                input.ident.span(),
                "GridRow cannot be derived for a unit struct: it has no columns to bind",
            ));
        }
        Fields::Unnamed(_) => constructor_shape(&fields, &container, false)?,
        Fields::Named(_) if container.positional || container.constructor.is_some() => {
            constructor_shape(&fields, &container, true)?
        }
        Fields::Named(_) => properties_shape(&fields)?,
    };

    Ok(quote! {
        impl ::xml_grid::GridRow for #name {
            fn shape() -> ::xml_grid::TargetShape<Self> {
                #shape
            }
        }
    })
}

fn bind_fields<'a>(fields: &'a Fields, container: &ContainerAttrs) -> syn::Result<Vec<BoundField<'a>>> {
    fields
        .iter()
        .enumerate()
        .map(|(index, field)| {
            let attrs = FieldAttrs::parse(field)?;
            let column = match (&attrs.rename, &field.ident) {
                (Some(rename), _) => rename.clone(),
                (None, Some(ident)) => {
                    let ident = ident.unraw().to_string();
                    match container.rename_all {
                        Some(rule) => rule.apply(&ident),
                        None => ident,
                    }
                }
                (None, None) => index.to_string(),
            };
            Ok(BoundField {
                field,
                index,
                column,
                attrs,
            })
        })
        .collect()
}

fn properties_shape(fields: &[BoundField<'_>]) -> syn::Result<TokenStream2> {
    let bound: Vec<&BoundField<'_>> = fields.iter().filter(|f| f.attrs.skip.is_none()).collect();

    for (i, field) in bound.iter().enumerate() {
        if bound[..i].iter().any(|earlier| earlier.column == field.column) {
            return Err(syn::Error::new(
                field.field.span(),
                format!("more than one field binds column \"{}\"", field.column),
            ));
        }
    }

    let members = bound.iter().map(|f| {
        let ty = f.ty();
        let column = &f.column;
        let ident = &f.field.ident;
        let required = f.attrs.required.map(|_| quote! { .required() });
        quote! {
            ::xml_grid::Member::new::<#ty>(#column, |target: &mut Self, value: #ty| target.#ident = value)
                #required
        }
    });

    Ok(quote! {
        ::xml_grid::TargetShape::properties(
            <Self as ::core::default::Default>::default,
            ::std::vec![#(#members),*],
        )
    })
}

fn constructor_shape(
    fields: &[BoundField<'_>],
    container: &ContainerAttrs,
    named: bool,
) -> syn::Result<TokenStream2> {
    for field in fields {
        if let Some(span) = field.attrs.required {
            return Err(syn::Error::new(
                span,
                "`required` only applies to property-bound structs; every constructor parameter is required",
            ));
        }
        if let Some(span) = field.attrs.skip {
            return Err(syn::Error::new(
                span,
                "`skip` only applies to property-bound structs",
            ));
        }
    }

    let parameters = fields.iter().map(|f| {
        let ty = f.ty();
        let column = &f.column;
        quote! { ::xml_grid::Parameter::of::<#ty>(#column) }
    });

    let converters: Vec<_> = fields.iter().map(|f| format_ident!("__grid_c{}", f.index)).collect();
    let resolve = fields.iter().zip(&converters).map(|(f, conv)| {
        let ty = f.ty();
        quote! { let #conv = registry.converter_for::<#ty>(); }
    });
    let args = converters.iter().map(|conv| quote! { args.convert(&#conv)? });

    // A parameterless constructor never touches the registry or the row.
    let (registry, args_ident) = if fields.is_empty() {
        (format_ident!("_registry"), format_ident!("_args"))
    } else {
        (format_ident!("registry"), format_ident!("args"))
    };

    let construct = match &container.constructor {
        Some(path) => quote! { #path(#(#args),*) },
        None if named => {
            let idents = fields.iter().map(|f| &f.field.ident);
            quote! { Self { #(#idents: #args),* } }
        }
        None => quote! { Self(#(#args),*) },
    };

    Ok(quote! {
        ::xml_grid::TargetShape::constructor(
            ::std::vec![#(#parameters),*],
            |#registry: &::xml_grid::ConverterRegistry| -> ::xml_grid::BuildFn<Self> {
                #(#resolve)*
                ::std::boxed::Box::new(
                    move |#args_ident: &mut ::xml_grid::Arguments<'_>| -> ::xml_grid::Result<Self> {
                        ::core::result::Result::Ok(#construct)
                    },
                )
            },
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rename_rules() {
        assert_eq!(RenameRule::PascalCase.apply("date_published"), "DatePublished");
        assert_eq!(RenameRule::CamelCase.apply("date_published"), "datePublished");
        assert_eq!(RenameRule::SnakeCase.apply("date_published"), "date_published");
        assert_eq!(RenameRule::Lowercase.apply("isbn_10"), "isbn_10");
        assert_eq!(RenameRule::Uppercase.apply("isbn_10"), "ISBN_10");
        assert_eq!(RenameRule::PascalCase.apply("title"), "Title");
    }

    #[test]
    fn test_unknown_rename_rule() {
        assert_eq!(RenameRule::parse("kebab-case"), None);
        assert_eq!(RenameRule::parse("camelCase"), Some(RenameRule::CamelCase));
    }

    #[test]
    fn test_property_struct_expansion() {
        let input: DeriveInput = syn::parse_quote! {
            #[grid(rename_all = "PascalCase")]
            struct Book {
                #[grid(required)]
                title: String,
                number_of_pages: i32,
                #[grid(skip)]
                cached: u8,
            }
        };
        let expanded = expand(&input).unwrap().to_string();
        assert!(expanded.contains("\"Title\""));
        assert!(expanded.contains("\"NumberOfPages\""));
        assert!(expanded.contains("required"));
        assert!(!expanded.contains("cached"));
    }

    #[test]
    fn test_tuple_struct_is_constructor_bound() {
        let input: DeriveInput = syn::parse_quote! {
            struct Pair(String, u32);
        };
        let expanded = expand(&input).unwrap().to_string();
        assert!(expanded.contains("constructor"));
        assert!(expanded.contains("\"1\""));
        assert!(!expanded.contains("properties"));
    }

    #[test]
    fn test_empty_tuple_struct_takes_no_arguments() {
        let input: DeriveInput = syn::parse_quote! {
            struct Nothing();
        };
        let expanded = expand(&input).unwrap().to_string();
        assert!(expanded.contains("constructor"));
        assert!(expanded.contains("_args"));
        assert!(!expanded.contains("converter_for"));
    }

    #[test]
    fn test_rejects_enums_and_generics() {
        let input: DeriveInput = syn::parse_quote! {
            enum Kind { A, B }
        };
        assert!(expand(&input).is_err());

        let input: DeriveInput = syn::parse_quote! {
            struct Wrapper<T> { value: T }
        };
        assert!(expand(&input).is_err());
    }

    #[test]
    fn test_rejects_misused_attributes() {
        let input: DeriveInput = syn::parse_quote! {
            #[grid(positional)]
            struct Magazine {
                #[grid(required)]
                title: String,
            }
        };
        assert!(expand(&input).is_err());

        let input: DeriveInput = syn::parse_quote! {
            struct Book {
                #[grid(rename = "Title")]
                name: String,
                #[grid(rename = "Title")]
                title: String,
            }
        };
        assert!(expand(&input).is_err());

        let input: DeriveInput = syn::parse_quote! {
            #[grid(rename_all = "kebab-case")]
            struct Book { title: String }
        };
        assert!(expand(&input).is_err());
    }
}
