use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields};

#[proc_macro_derive(EnumDebug)]
pub fn derive_enum_debug(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let Data::Enum(data) = &input.data else {
        return syn::Error::new_spanned(&input, "EnumDebug can only be derived for enums")
            .to_compile_error()
            .into();
    };

    let arms = data.variants.iter().map(|variant| {
        let variant_ident = &variant.ident;
        let variant_name = variant_ident.to_string();
        let pattern = match &variant.fields {
            Fields::Named(_) => quote! { #name::#variant_ident { .. } },
            Fields::Unnamed(_) => quote! { #name::#variant_ident(..) },
            Fields::Unit => quote! { #name::#variant_ident },
        };
        quote! { #pattern => #variant_name }
    });

    let expanded = quote! {
        impl #impl_generics ::enum_debug::EnumDebug for #name #ty_generics #where_clause {
            fn variant(&self) -> &'static str {
                match self {
                    #(#arms,)*
                }
            }
        }
    };

    expanded.into()
}
