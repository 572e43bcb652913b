//! Procedural macros for exposing agent operations over JSON-RPC.
//!
//! The `#[operation]` attribute decorates an async free function whose first
//! argument is a shared reference to the agent type it operates on, and
//! generates the registration glue the Dispatcher's reflection cache reads
//! at first access.

use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::{format_ident, quote};
use syn::parse::{Parse, ParseStream};
use syn::parse_macro_input;
use syn::spanned::Spanned;
use syn::{
    Error, Expr, ItemFn, Lit, LitStr, MetaNameValue, PatType, Result, ReturnType, Type,
};

#[derive(Default)]
struct OperationArgs {
    name: Option<LitStr>,
}

impl OperationArgs {
    fn parse(args: Vec<MetaNameValue>) -> Result<Self> {
        let mut parsed = OperationArgs::default();
        for arg in args {
            let MetaNameValue { path, value, .. } = arg;
            if path.is_ident("name") {
                parsed.name = Some(expect_lit_str(value, "name")?);
            } else {
                return Err(Error::new(
                    path.span(),
                    "unsupported attribute key; expected `name`",
                ));
            }
        }
        Ok(parsed)
    }
}

fn expect_lit_str(expr: Expr, field: &str) -> Result<LitStr> {
    match expr {
        Expr::Lit(syn::ExprLit {
            lit: Lit::Str(lit), ..
        }) => Ok(lit),
        other => Err(Error::new(
            other.span(),
            format!("`{field}` must be a string literal"),
        )),
    }
}

struct OperationAttrInput {
    entries: Vec<MetaNameValue>,
}

impl Parse for OperationAttrInput {
    fn parse(input: ParseStream<'_>) -> Result<Self> {
        let mut entries = Vec::new();
        while !input.is_empty() {
            entries.push(input.parse()?);
            if input.peek(syn::Token![,]) {
                let _ = input.parse::<syn::Token![,]>()?;
            }
        }
        Ok(Self { entries })
    }
}

/// Returns `true` if `ty` is `Option<_>`, meaning the parameter is optional.
fn is_option(ty: &Type) -> bool {
    if let Type::Path(path) = ty {
        path.path.segments.last().is_some_and(|seg| seg.ident == "Option")
    } else {
        false
    }
}

/// `&AgentType` -> `AgentType`.
fn agent_type_from_receiver(ty: &Type) -> Result<&Type> {
    match ty {
        Type::Reference(reference) => Ok(reference.elem.as_ref()),
        other => Err(Error::new(
            other.span(),
            "the first parameter of an operation must be `&AgentType`",
        )),
    }
}

#[proc_macro_attribute]
#[allow(clippy::too_many_lines, clippy::missing_panics_doc)]
pub fn operation(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args_tokens = parse_macro_input!(attr as OperationAttrInput);
    let args = match OperationArgs::parse(args_tokens.entries) {
        Ok(args) => args,
        Err(err) => return err.to_compile_error().into(),
    };

    let function = parse_macro_input!(item as ItemFn);

    if function.sig.asyncness.is_none() {
        return Error::new(function.sig.ident.span(), "operations must be async")
            .to_compile_error()
            .into();
    }

    let mut inputs = function.sig.inputs.iter();
    let Some(syn::FnArg::Typed(receiver)) = inputs.next() else {
        return Error::new(
            function.sig.span(),
            "operations must take `agent: &AgentType` as their first parameter",
        )
        .to_compile_error()
        .into();
    };
    let agent_type = match agent_type_from_receiver(&receiver.ty) {
        Ok(ty) => ty.clone(),
        Err(err) => return err.to_compile_error().into(),
    };

    let mut params = Vec::new();
    for arg in inputs {
        let syn::FnArg::Typed(pat_type) = arg else {
            return Error::new(arg.span(), "operations cannot take `self` receivers")
                .to_compile_error()
                .into();
        };
        let PatType { pat, ty, .. } = pat_type;
        let ident = match pat.as_ref() {
            syn::Pat::Ident(pat_ident) => pat_ident.ident.clone(),
            other => {
                return Error::new(other.span(), "operation parameters must be simple identifiers")
                    .to_compile_error()
                    .into();
            }
        };
        let required = !is_option(ty);
        params.push((ident, (**ty).clone(), required));
    }

    let original_output = function.sig.output.clone();
    let success_ty = match &original_output {
        ReturnType::Type(_, ty) => match extract_result_ok_ty(ty) {
            Ok(ty) => ty,
            Err(err) => return err.to_compile_error().into(),
        },
        ReturnType::Default => {
            return Error::new(
                function.sig.span(),
                "operations must return agent_dispatch::OperationResult<T>",
            )
            .to_compile_error()
            .into();
        }
    };

    let fn_ident = &function.sig.ident;
    let method_lit = args
        .name
        .unwrap_or_else(|| LitStr::new(&fn_ident.to_string(), Span::call_site()));
    let descriptor_fn_ident = format_ident!("__{}_descriptor", fn_ident);

    let param_name_lits: Vec<LitStr> = params
        .iter()
        .map(|(ident, _, _)| LitStr::new(&ident.to_string(), Span::call_site()))
        .collect();
    let param_required: Vec<bool> = params.iter().map(|(_, _, required)| *required).collect();

    let decode_params = params.iter().map(|(ident, ty, required)| {
        let name_lit = LitStr::new(&ident.to_string(), Span::call_site());
        if *required {
            quote! {
                let #ident: #ty = match params.get(#name_lit) {
                    Some(value) => ::serde_json::from_value(value.clone()).map_err(|err| {
                        ::agent_primitives::RpcError::new(
                            ::agent_primitives::RpcErrorCode::InvalidParams,
                            format!("failed to decode parameter `{}`: {err}", #name_lit),
                        )
                    })?,
                    None => {
                        return Err(::agent_primitives::RpcError::new(
                            ::agent_primitives::RpcErrorCode::InvalidParams,
                            format!("missing required parameter `{}`", #name_lit),
                        ));
                    }
                };
            }
        } else {
            quote! {
                let #ident: #ty = match params.get(#name_lit) {
                    Some(value) => ::serde_json::from_value(value.clone()).map_err(|err| {
                        ::agent_primitives::RpcError::new(
                            ::agent_primitives::RpcErrorCode::InvalidParams,
                            format!("failed to decode parameter `{}`: {err}", #name_lit),
                        )
                    })?,
                    None => None,
                };
            }
        }
    });
    let arg_idents: Vec<_> = params.iter().map(|(ident, _, _)| ident).collect();

    let expanded = quote! {
        #function

        #[allow(non_snake_case)]
        fn #descriptor_fn_ident() -> ::agent_dispatch::OperationDescriptor {
            fn invoke<'a>(
                agent: &'a dyn ::agent_dispatch::Agent,
                params: ::serde_json::Map<String, ::serde_json::Value>,
            ) -> ::std::pin::Pin<::std::boxed::Box<dyn ::std::future::Future<Output = Result<::serde_json::Value, ::agent_primitives::RpcError>> + Send + 'a>> {
                ::std::boxed::Box::pin(async move {
                    let agent = agent
                        .as_any()
                        .downcast_ref::<#agent_type>()
                        .expect("reflection cache only invokes operations on their declared agent type");
                    #(#decode_params)*
                    let result: #success_ty = #fn_ident(agent, #(#arg_idents),*).await?;
                    ::serde_json::to_value(result).map_err(|err| {
                        ::agent_primitives::RpcError::new(
                            ::agent_primitives::RpcErrorCode::InternalError,
                            format!("failed to encode response for `{}`: {err}", #method_lit),
                        )
                    })
                })
            }

            ::agent_dispatch::OperationDescriptor::new(
                #method_lit,
                vec![#(::agent_dispatch::ParamDescriptor::new(#param_name_lits, #param_required)),*],
                invoke,
            )
        }

        ::agent_dispatch::inventory::submit! {
            ::agent_dispatch::OperationRegistration::new(
                ::core::any::type_name::<#agent_type>(),
                #descriptor_fn_ident,
            )
        }
    };

    TokenStream::from(expanded)
}

fn extract_result_ok_ty(ty: &Type) -> Result<Type> {
    match ty {
        Type::Path(path) => {
            let last = path.path.segments.last().ok_or_else(|| {
                Error::new(path.span(), "unsupported return type for operation")
            })?;
            if last.ident != "OperationResult" && last.ident != "Result" {
                return Err(Error::new(
                    last.ident.span(),
                    "operations must return agent_dispatch::OperationResult<T>",
                ));
            }
            match &last.arguments {
                syn::PathArguments::AngleBracketed(args) if !args.args.is_empty() => {
                    match &args.args[0] {
                        syn::GenericArgument::Type(ty) => Ok(ty.clone()),
                        other => Err(Error::new(other.span(), "unsupported generic argument")),
                    }
                }
                other => Err(Error::new(other.span(), "expected a generic success type")),
            }
        }
        other => Err(Error::new(other.span(), "unsupported return type for operation")),
    }
}
