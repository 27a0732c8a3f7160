//! # bound-lint-macros
//!
//! Procedural macros for running bound-lint as part of `cargo test`.
//!
//! Use them through the `bound-lint` facade crate:
//!
//! ```rust,ignore
//! // tests/architecture.rs
//! bound_lint::check!();
//! bound_lint::check!(policy = "config/bound-lint.toml", name = boundaries_hold);
//! ```

#![forbid(unsafe_code)]

use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::quote;
use syn::parse::{Parse, ParseStream};
use syn::{parse_macro_input, Ident, LitStr, Token};

/// Name of the generated test when `name` is not given.
const DEFAULT_TEST_NAME: &str = "bound_lint_architecture";

/// Arguments accepted by `check!`.
#[derive(Debug, Default)]
struct CheckArgs {
    policy: Option<LitStr>,
    name: Option<Ident>,
}

impl Parse for CheckArgs {
    fn parse(input: ParseStream<'_>) -> syn::Result<Self> {
        let mut args = Self::default();

        while !input.is_empty() {
            let key: Ident = input.parse()?;
            input.parse::<Token![=]>()?;

            match key.to_string().as_str() {
                "policy" => {
                    if args.policy.is_some() {
                        return Err(syn::Error::new(key.span(), "duplicate `policy` argument"));
                    }
                    args.policy = Some(input.parse()?);
                }
                "name" => {
                    if args.name.is_some() {
                        return Err(syn::Error::new(key.span(), "duplicate `name` argument"));
                    }
                    args.name = Some(input.parse()?);
                }
                other => {
                    return Err(syn::Error::new(
                        key.span(),
                        format!("unknown argument `{other}`, expected `policy` or `name`"),
                    ));
                }
            }

            if input.is_empty() {
                break;
            }
            input.parse::<Token![,]>()?;
        }

        Ok(args)
    }
}

/// Generates a `#[test]` that checks the workspace against its policy.
///
/// The test runs the full analysis from the workspace root and panics with
/// the text report when any boundary violation or forbidden dependency is
/// found, or when the run is truncated.
///
/// # Arguments
///
/// - `policy = "path"`: policy file, relative to the workspace root.
///   Defaults to `bound-lint.toml` or `.bound-lint.toml` in the crate or
///   workspace root.
/// - `name = ident`: name of the generated test function.
///
/// ```rust,ignore
/// bound_lint::check!(policy = "bound-lint.toml");
/// ```
#[proc_macro]
pub fn check(input: TokenStream) -> TokenStream {
    let args = parse_macro_input!(input as CheckArgs);
    expand_check(&args).into()
}

fn expand_check(args: &CheckArgs) -> TokenStream2 {
    let name = args
        .name
        .clone()
        .unwrap_or_else(|| Ident::new(DEFAULT_TEST_NAME, Span::call_site()));
    let policy = match &args.policy {
        Some(path) => quote!(::core::option::Option::Some(#path)),
        None => quote!(::core::option::Option::None),
    };

    quote! {
        #[test]
        fn #name() {
            ::bound_lint::__internal::run_check(#policy);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> syn::Result<CheckArgs> {
        syn::parse_str(src)
    }

    #[test]
    fn empty_input_uses_defaults() {
        let args = parse("").unwrap();
        let out = expand_check(&args).to_string();
        assert!(out.contains("fn bound_lint_architecture"));
        assert!(out.contains("run_check"));
        assert!(out.contains("Option :: None"));
    }

    #[test]
    fn policy_and_name_are_forwarded() {
        let args = parse(r#"policy = "ci/bound-lint.toml", name = layers_hold,"#).unwrap();
        let out = expand_check(&args).to_string();
        assert!(out.contains("fn layers_hold"));
        assert!(out.contains(r#""ci/bound-lint.toml""#));
    }

    #[test]
    fn unknown_argument_is_rejected() {
        let err = parse(r#"preset = "strict""#).unwrap_err();
        assert!(err.to_string().contains("unknown argument `preset`"));
    }

    #[test]
    fn duplicate_argument_is_rejected() {
        let err = parse(r#"policy = "a.toml", policy = "b.toml""#).unwrap_err();
        assert!(err.to_string().contains("duplicate `policy`"));
    }

    #[test]
    fn policy_must_be_a_string() {
        assert!(parse("policy = strict").is_err());
    }
}
