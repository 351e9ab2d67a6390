//! Proc macros for DAS boundary entry points.
//!
//! Provides `#[das_export]`, which turns a native function into a C-ABI
//! export routed through the boundary translator.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{
    Attribute, Expr, FnArg, GenericArgument, Ident, ItemFn, Lit, Meta, Pat, PatType, PathArguments,
    ReturnType, Type, parse_macro_input,
};

/// Exports a native function through the C ABI.
///
/// The function keeps its body and signature under a hidden name; the
/// exported symbol takes the original name and returns an `i32` status.
///
/// - `fn f(args…) -> DasResult<T>` exports `f(args…, out: *mut T) -> i32`.
///   A null `out` is rejected before the body runs.
/// - `fn f(args…) -> DasResult<()>` exports `f(args…) -> i32`.
/// - `#[das_export(status)] fn f(args…) -> DasStatus` exports
///   `f(args…) -> i32`; a failing status is raised with the message parked
///   in the error-info slot.
///
/// On failure the translated exception is left pending for
/// `das_get_last_error`. Panics never cross the boundary.
///
/// Doc comments move to the exported symbol. A generic `# Safety` section
/// is appended unless the docs already have one.
///
/// # Example
///
/// ```ignore
/// #[das_export]
/// fn das_probe_succeed(value: i32) -> DasResult<i32> {
///     Ok(value)
/// }
/// ```
#[proc_macro_attribute]
pub fn das_export(attr: TokenStream, item: TokenStream) -> TokenStream {
    let input_fn = parse_macro_input!(item as ItemFn);
    let status_mode = match parse_mode(attr.into()) {
        Ok(mode) => mode,
        Err(e) => return e.to_compile_error().into(),
    };

    match expand(&input_fn, status_mode) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

fn parse_mode(attr: TokenStream2) -> syn::Result<bool> {
    if attr.is_empty() {
        return Ok(false);
    }
    let ident: Ident = syn::parse2(attr)?;
    if ident == "status" {
        Ok(true)
    } else {
        Err(syn::Error::new_spanned(
            ident,
            "expected `#[das_export]` or `#[das_export(status)]`",
        ))
    }
}

fn expand(input_fn: &ItemFn, status_mode: bool) -> syn::Result<TokenStream2> {
    let sig = &input_fn.sig;
    if !sig.generics.params.is_empty() || sig.asyncness.is_some() {
        return Err(syn::Error::new_spanned(
            sig,
            "das_export functions cannot be generic or async",
        ));
    }

    let fn_name = &sig.ident;
    let inner_fn_name = format_ident!("__das_inner_{}", fn_name);
    let entry = fn_name.to_string();

    let fn_vis = &input_fn.vis;
    let attrs = &input_fn.attrs;
    let (doc_attrs, fn_attrs): (Vec<_>, Vec<_>) =
        attrs.iter().partition(|attr| attr.path().is_ident("doc"));
    let fn_block = &input_fn.block;
    let fn_output = &sig.output;
    let fn_inputs = &sig.inputs;
    let fn_unsafety = &sig.unsafety;

    let mut arg_names = Vec::new();
    for input in fn_inputs {
        let FnArg::Typed(PatType { pat, .. }) = input else {
            return Err(syn::Error::new_spanned(
                input,
                "das_export functions cannot take self",
            ));
        };
        let Pat::Ident(pat_ident) = pat.as_ref() else {
            return Err(syn::Error::new_spanned(
                pat,
                "das_export arguments must be plain identifiers",
            ));
        };
        arg_names.push(pat_ident.ident.clone());
    }

    let call = if fn_unsafety.is_some() {
        quote! { unsafe { #inner_fn_name(#(#arg_names),*) } }
    } else {
        quote! { #inner_fn_name(#(#arg_names),*) }
    };

    let inner_fn = quote! {
        #(#fn_attrs)*
        #[inline]
        #fn_unsafety fn #inner_fn_name(#fn_inputs) #fn_output #fn_block
    };

    let documented_safety = doc_attrs
        .iter()
        .any(|attr| doc_text(attr).is_some_and(|text| text.trim() == "# Safety"));
    let wrapper_doc = if documented_safety {
        quote! {
            #(#doc_attrs)*
        }
    } else {
        quote! {
            #(#doc_attrs)*
            ///
            /// # Safety
            ///
            /// Pointer arguments must satisfy the contract of the native function
            /// this wraps; output pointers must be null or valid for a write.
        }
    };

    if status_mode {
        return Ok(quote! {
            #inner_fn

            #wrapper_doc
            #[unsafe(no_mangle)]
            #fn_vis unsafe extern "C" fn #fn_name(#fn_inputs) -> i32 {
                ::das_bridge::ffi::export_status(#entry, move || #call)
            }
        });
    }

    match result_payload(fn_output)? {
        None => Ok(quote! {
            #inner_fn

            #wrapper_doc
            #[unsafe(no_mangle)]
            #fn_vis unsafe extern "C" fn #fn_name(#fn_inputs) -> i32 {
                ::das_bridge::ffi::export_call_unit(#entry, move || #call)
            }
        }),
        Some(payload) => {
            let out_sep = if fn_inputs.is_empty() || fn_inputs.trailing_punct() {
                quote! {}
            } else {
                quote! { , }
            };
            Ok(quote! {
                #inner_fn

                #wrapper_doc
                #[unsafe(no_mangle)]
                #fn_vis unsafe extern "C" fn #fn_name(
                    #fn_inputs #out_sep __das_out: *mut #payload
                ) -> i32 {
                    let __das_op = move || #call;
                    unsafe { ::das_bridge::ffi::export_call(#entry, __das_out, __das_op) }
                }
            })
        }
    }
}

fn doc_text(attr: &Attribute) -> Option<String> {
    let Meta::NameValue(meta) = &attr.meta else {
        return None;
    };
    let Expr::Lit(expr) = &meta.value else {
        return None;
    };
    let Lit::Str(text) = &expr.lit else {
        return None;
    };
    Some(text.value())
}

/// `T` of a `DasResult<T>` return type, or `None` when `T` is `()`.
fn result_payload(output: &ReturnType) -> syn::Result<Option<Type>> {
    let error = || {
        syn::Error::new_spanned(
            output,
            "das_export functions must return DasResult<T> (or use #[das_export(status)])",
        )
    };

    let ReturnType::Type(_, ty) = output else {
        return Err(error());
    };
    let Type::Path(type_path) = ty.as_ref() else {
        return Err(error());
    };
    let Some(segment) = type_path.path.segments.last() else {
        return Err(error());
    };
    if segment.ident != "DasResult" {
        return Err(error());
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return Err(error());
    };
    let Some(GenericArgument::Type(payload)) = args.args.first() else {
        return Err(error());
    };

    match payload {
        Type::Tuple(tuple) if tuple.elems.is_empty() => Ok(None),
        other => Ok(Some(other.clone())),
    }
}
