use darling::FromDeriveInput;
use proc_macro::{self, TokenStream};
use quote::quote;
use syn::{parse_macro_input, parse_quote, DeriveInput};

#[derive(FromDeriveInput, Default)]
#[darling(default, attributes(Tabulate))]
struct Opts {
    #[darling(rename = "Counter")]
    counter: Option<syn::TypePath>,
}

#[proc_macro_derive(Tabulate, attributes(Tabulate))]
pub fn derive(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let opts = match Opts::from_derive_input(&input) {
        Ok(opts) => opts,
        Err(err) => return err.write_errors().into(),
    };
    let ident = &input.ident;

    // One ledger per wrapped type, keyed on `(Self, __ProbeValue)`.
    let mut generics = input.generics.clone();
    generics.params.push(parse_quote!(__ProbeValue: 'static));
    let (impl_generics, _, _) = generics.split_for_impl();
    let (_, ty_generics, where_clause) = input.generics.split_for_impl();

    let counter_ty = match opts.counter {
        Some(counter_ty) => quote! { #counter_ty },
        None => quote! { lifecycle_probe::counter::RelaxedCounter },
    };

    let output = quote! {
        #[automatically_derived]
        impl #impl_generics lifecycle_probe::Tabulate<__ProbeValue> for #ident #ty_generics #where_clause {
            type Counter = #counter_ty;
            fn ledger() -> &'static lifecycle_probe::Ledger<#counter_ty> {
                lifecycle_probe::ledger_for::<(Self, __ProbeValue), #counter_ty>()
            }
        }
    };
    output.into()
}
