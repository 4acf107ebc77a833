use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::quote;
use syn::{parse::Parser, parse_macro_input, Data, DataStruct, DeriveInput, Fields, Meta};

/// 生成 Model trait 的实现
///
/// 自动生成 `TABLE` 和 `PK` 常量
///
/// 使用示例：
/// ```ignore
/// #[derive(Model)]
/// #[model(table = "users", pk = "id")]
/// struct User {
///     id: i64,
///     name: String,
/// }
///
/// // 未指定表名时使用结构体名的蛇形命名：order_item
/// #[derive(Model)]
/// struct OrderItem {
///     id: i64,
/// }
/// ```
#[proc_macro_derive(Model, attributes(model))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let table = string_attr(&input.attrs, "model", "table").unwrap_or_else(|| {
        // 将 PascalCase 转换为 snake_case
        let s = name.to_string();
        let mut result = String::new();
        for (i, c) in s.chars().enumerate() {
            if c.is_uppercase() && i > 0 {
                result.push('_');
            }
            result.push(c.to_ascii_lowercase());
        }
        result
    });
    // 如果没有指定主键，默认使用 "id"
    let pk = string_attr(&input.attrs, "model", "pk").unwrap_or_else(|| "id".to_string());
    let table_lit = syn::LitStr::new(&table, Span::call_site());
    let pk_lit = syn::LitStr::new(&pk, Span::call_site());

    let expanded: proc_macro2::TokenStream = quote! {
        impl #impl_generics sqlxfluent::Model for #name #ty_generics #where_clause {
            const TABLE: &'static str = #table_lit;
            const PK: &'static str = #pk_lit;
        }
    };

    TokenStream::from(expanded)
}

/// 生成 IntoData trait 的实现
///
/// 每个字段写入一列，`Option` 字段为 `None` 时写入 NULL
///
/// 使用示例：
/// ```ignore
/// #[derive(IntoData)]
/// struct NewUser {
///     name: String,
///     #[column(name = "mail")]
///     email: Option<String>,
///     #[skip]
///     password_confirm: String,
/// }
///
/// let builder = table("users").insert([new_user.into_data()]);
/// ```
#[proc_macro_derive(IntoData, attributes(column, skip))]
pub fn derive_into_data(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    // 获取字段列表（必须是具名字段的结构体）
    let fields = match &input.data {
        Data::Struct(DataStruct {
            fields: Fields::Named(fields),
            ..
        }) => &fields.named,
        _ => {
            return syn::Error::new_spanned(
                name,
                "IntoData derive only supports structs with named fields",
            )
            .to_compile_error()
            .into();
        }
    };

    let mut field_idents: Vec<&syn::Ident> = Vec::new();
    let mut column_names: Vec<syn::LitStr> = Vec::new();

    for field in fields {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        if field.attrs.iter().any(|attr| attr.path().is_ident("skip")) {
            continue;
        }

        let column =
            string_attr(&field.attrs, "column", "name").unwrap_or_else(|| ident.to_string());
        field_idents.push(ident);
        column_names.push(syn::LitStr::new(&column, Span::call_site()));
    }

    let expanded: proc_macro2::TokenStream = quote! {
        impl #impl_generics sqlxfluent::IntoData for #name #ty_generics #where_clause {
            fn into_data(self) -> sqlxfluent::Data {
                let mut data = sqlxfluent::Data::new();
                #(
                    data.insert(#column_names, self.#field_idents);
                )*
                data
            }
        }
    };

    TokenStream::from(expanded)
}

/// 读取 `#[attr_name(key = "...")]` 中的字符串值
fn string_attr(attrs: &[syn::Attribute], attr_name: &str, key: &str) -> Option<String> {
    for attr in attrs {
        if !attr.path().is_ident(attr_name) {
            continue;
        }
        let Meta::List(list) = &attr.meta else {
            continue;
        };
        let parser = syn::punctuated::Punctuated::<Meta, syn::Token![,]>::parse_terminated;
        let Ok(metas) = parser.parse2(list.tokens.clone()) else {
            continue;
        };
        for meta in metas {
            if let Meta::NameValue(nv) = meta {
                if nv.path.is_ident(key) {
                    if let syn::Expr::Lit(syn::ExprLit {
                        lit: syn::Lit::Str(s),
                        ..
                    }) = nv.value
                    {
                        return Some(s.value());
                    }
                }
            }
        }
    }
    None
}
