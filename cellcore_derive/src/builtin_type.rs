use proc_macro2::TokenStream;
use quote::quote;
use syn::spanned::Spanned;
use syn::*;

use crate::crate_path;

pub fn derive(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let krate = crate_path();

    if !matches!(input.data, Data::Struct(_) | Data::Enum(_)) {
        abort!(
            input.span(),
            "BuiltinType can only be derived for structs and enums";
            note = "unions cannot implement Clone/PartialEq/Hash uniformly"
        );
    }

    let expanded = quote! {
        #[automatically_derived]
        impl #impl_generics #krate::holder::HolderBody for #name #ty_generics #where_clause {
            fn type_name(&self) -> &'static str {
                stringify!(#name)
            }

            fn duplicate(&self) -> ::std::boxed::Box<dyn #krate::holder::HolderBody> {
                ::std::boxed::Box::new(::std::clone::Clone::clone(self))
            }

            fn compare(&self, other: &dyn #krate::holder::HolderBody) -> bool {
                match #krate::holder::HolderBody::as_any(other).downcast_ref::<Self>() {
                    ::std::option::Option::Some(other) => self == other,
                    ::std::option::Option::None => false,
                }
            }

            fn hash_value(&self, state: &mut dyn ::std::hash::Hasher) {
                ::std::hash::Hash::hash(self, state);
            }

            fn to_display_string(&self) -> ::std::string::String {
                ::std::format!("{}", self)
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                self
            }
        }
    };

    proc_macro::TokenStream::from(expanded)
}
