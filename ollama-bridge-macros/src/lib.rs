use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, DeriveInput};

/// Derives `fn from_bytes(bytes::Bytes) -> crate::Result<Self>` for a
/// `Deserialize` type. A body that is not valid JSON for the type becomes
/// `crate::Error::MalformedResponse`, naming the type that failed to decode.
#[proc_macro_derive(FromBytes)]
pub fn derive_from_bytes(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    TokenStream::from(expand_from_bytes(&input))
}

fn expand_from_bytes(input: &DeriveInput) -> proc_macro2::TokenStream {
    let name = &input.ident;
    let type_name = name.to_string();
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    quote! {
        impl #impl_generics #name #ty_generics #where_clause {
            pub fn from_bytes(bytes: ::bytes::Bytes) -> crate::Result<Self> {
                ::serde_json::from_slice(&bytes).map_err(|e| {
                    crate::Error::MalformedResponse(format!("{}: {}", #type_name, e))
                })
            }
        }
    }
}
