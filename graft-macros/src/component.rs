//! Expansion of `#[derive(Component)]`.

use darling::ast::{Data, Style};
use darling::util::Ignored;
use darling::{FromDeriveInput, FromField, FromMeta};
use proc_macro2::TokenStream;
use quote::{quote, quote_spanned};
use syn::spanned::Spanned;
use syn::{DeriveInput, Ident, Type};

#[derive(FromDeriveInput)]
#[darling(attributes(component), supports(struct_any))]
struct ComponentInput {
    ident: Ident,
    generics: syn::Generics,
    data: Data<Ignored, ComponentField>,
    #[darling(default)]
    namespace: Option<String>,
    #[darling(multiple)]
    provides: Vec<Provides>,
    #[darling(multiple)]
    after_create: Vec<Ident>,
    #[darling(multiple)]
    capability: Vec<Type>,
}

#[derive(FromField)]
#[darling(attributes(component))]
struct ComponentField {
    ident: Option<Ident>,
    ty: Type,
    #[darling(default)]
    property: Option<String>,
}

#[derive(FromMeta)]
struct Provides {
    ty: Type,
    method: Ident,
    #[darling(default)]
    shared: bool,
}

pub(crate) fn expand(input: &DeriveInput) -> darling::Result<TokenStream> {
    let component = ComponentInput::from_derive_input(input)?;
    component.expand()
}

impl ComponentInput {
    fn expand(self) -> darling::Result<TokenStream> {
        let ComponentInput {
            ident,
            generics,
            data,
            namespace,
            provides,
            after_create,
            capability,
        } = self;

        if !generics.params.is_empty() {
            return Err(darling::Error::custom("`Component` cannot be derived for generic types")
                .with_span(&generics));
        }

        let fields = data
            .take_struct()
            .ok_or_else(|| darling::Error::unsupported_shape("enum").with_span(&ident))?;

        let mut parameters = Vec::with_capacity(fields.fields.len());
        let mut values = Vec::with_capacity(fields.fields.len());
        for field in &fields.fields {
            let ty = &field.ty;
            let (parameter, value) = match &field.property {
                Some(key) => (
                    quote!(::graft::Parameter::property(#key)),
                    quote_spanned!(ty.span()=> <#ty as ::graft::FromProperty>::from_property(args.property()?)),
                ),
                None => (
                    quote!(::graft::Parameter::dependency::<#ty>()),
                    quote_spanned!(ty.span()=> args.dependency::<#ty>()?),
                ),
            };
            parameters.push(parameter);
            values.push(value);
        }

        let body = match fields.style {
            Style::Struct => {
                let names = fields.fields.iter().map(|field| &field.ident);
                quote!(#ident { #(#names: #values,)* })
            }
            Style::Tuple => quote!(#ident(#(#values,)*)),
            Style::Unit => quote!(#ident),
        };

        let namespace = match namespace {
            Some(namespace) => quote!(#namespace),
            None => quote!(::std::module_path!()),
        };

        let factories = provides.iter().map(|Provides { ty, method, shared }| {
            let name = method.to_string();
            if *shared {
                quote! {
                    .provides_shared::<#ty>(#name, |component: &#ident| -> ::std::sync::Arc<#ty> {
                        component.#method()
                    })
                }
            } else {
                quote! {
                    .provides::<#ty>(#name, |component: &#ident| -> #ty { component.#method() })
                }
            }
        });

        let capabilities = capability.iter().map(|ty| {
            quote! {
                .capability::<#ty>(|component: ::std::sync::Arc<#ident>| -> ::std::sync::Arc<#ty> {
                    component
                })
            }
        });

        let hooks = after_create.iter().map(|method| {
            let name = method.to_string();
            quote!(.after_create(#name, |component: &#ident| component.#method()))
        });

        Ok(quote! {
            impl ::graft::Component for #ident {
                fn descriptor() -> ::graft::ComponentDescriptor {
                    ::graft::ComponentDescriptor::builder::<#ident>()
                        .namespace(#namespace)
                        .constructor(
                            ::std::vec![#(#parameters),*],
                            |args: &mut ::graft::Arguments| {
                                let _ = &args;
                                ::std::result::Result::Ok(#body)
                            },
                        )
                        #(#factories)*
                        #(#capabilities)*
                        #(#hooks)*
                        .build()
                }
            }

            ::graft::__private::inventory::submit! {
                ::graft::ComponentRegistration::new(<#ident as ::graft::Component>::descriptor)
            }
        })
    }
}
