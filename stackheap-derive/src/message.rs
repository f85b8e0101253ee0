use {
    crate::common::{Field, JsonRendering, MessageArgs},
    darling::{ast::Data, Error, FromDeriveInput, Result},
    proc_macro2::TokenStream,
    quote::{format_ident, quote},
    syn::{parse_quote, DeriveInput, GenericParam, Generics},
};

/// Add the `'de` decode lifetime to the impl generics, outliving the
/// struct's own lifetime if it has one.
///
/// Given `struct Foo<'a>`, fields such as `Cow<'a, str>` are decoded as
/// borrows of the `&'de [u8]` input, so `'de` must outlive `'a`.
fn append_de_lifetime(generics: &Generics) -> Generics {
    let mut generics = generics.clone();
    let param: GenericParam = match generics.lifetimes().next() {
        Some(param) => {
            let lifetime = &param.lifetime;
            parse_quote!('de: #lifetime)
        }
        None => parse_quote!('de),
    };
    generics.params.insert(0, param);
    generics
}

fn check_generics(generics: &Generics) -> Result<()> {
    let mut errors = Error::accumulator();
    for param in &generics.params {
        match param {
            GenericParam::Type(param) => errors.push(
                Error::custom("`Message` cannot be derived for generic types").with_span(param),
            ),
            GenericParam::Const(param) => errors.push(
                Error::custom("`Message` cannot be derived for const generic types")
                    .with_span(param),
            ),
            GenericParam::Lifetime(_) => {}
        }
    }
    if let Some(extra) = generics.lifetimes().nth(1) {
        errors.push(
            Error::custom("`Message` supports at most one lifetime parameter").with_span(extra),
        );
    }
    errors.finish()
}

pub(crate) fn generate(input: DeriveInput) -> Result<TokenStream> {
    let args = MessageArgs::from_derive_input(&input)?;
    check_generics(&args.generics)?;

    let Data::Struct(fields) = &args.data else {
        return Err(Error::custom("`Message` can only be derived for structs"));
    };
    let fields = &fields.fields;

    let crate_name = &args.crate_name;
    let ident = &args.ident;
    let appended_generics = append_de_lifetime(&args.generics);
    let (impl_generics, _, _) = appended_generics.split_for_impl();
    let (_, ty_generics, where_clause) = args.generics.split_for_impl();

    let members: Vec<_> = fields
        .iter()
        .filter_map(|field| field.ident.as_ref())
        .collect();
    let types: Vec<_> = fields.iter().map(|field| &field.ty).collect();
    let keys: Vec<_> = fields.iter().map(Field::json_key).collect();
    let indices: Vec<_> = (0..fields.len()).collect();
    let slots: Vec<_> = (0..fields.len())
        .map(|i| format_ident!("__field{}", i))
        .collect();
    let table = quote!(<Self as #crate_name::Message<'de>>::FIELDS);
    // Path exposing `json_len`, `write_json` and `read_json` for each field.
    let json: Vec<_> = fields
        .iter()
        .map(|field| match field.json {
            JsonRendering::Default => {
                let ty = &field.ty;
                quote!(<#ty as JsonField<'de>>)
            }
            JsonRendering::Numbers => quote!(#crate_name::json::numbers),
        })
        .collect();

    Ok(quote! {
        const _: () = {
            #[allow(unused_imports)]
            use #crate_name::{
                error::missing_field,
                json::{JsonDecoder, JsonEncoder, JsonField},
                layout::{add_heap_len, LayoutField, Reader, Writer},
                schema::{FieldDescriptor, FieldSpec},
                Result,
            };

            #[automatically_derived]
            impl #impl_generics #crate_name::Message<'de> for #ident #ty_generics #where_clause {
                const FIELDS: &'static [FieldDescriptor] = &#crate_name::schema::table([
                    #(FieldSpec::of::<#types>(#keys),)*
                ]);

                #[inline]
                fn heap_len(&self) -> u32 {
                    let len = 0u32;
                    #(
                        let len = add_heap_len(
                            len,
                            <#types as LayoutField<'de>>::heap_len(&self.#members),
                        );
                    )*
                    len
                }

                fn write_fields(&self, writer: &mut Writer<'_>) {
                    let fields = #table;
                    #(
                        <#types as LayoutField<'de>>::write(
                            &self.#members,
                            writer,
                            fields[#indices].offset,
                        );
                    )*
                }

                fn read_fields(reader: &Reader<'de>) -> Result<Self> {
                    let fields = #table;
                    Ok(Self {
                        #(
                            #members: <#types as LayoutField<'de>>::read(
                                reader,
                                fields[#indices].offset,
                            )?,
                        )*
                    })
                }

                #[inline]
                fn json_values_len(&self) -> usize {
                    0usize #(+ #json::json_len(&self.#members))*
                }

                fn write_json(&self, encoder: &mut JsonEncoder<'_>) {
                    let fields = #table;
                    encoder.begin_object();
                    #(
                        encoder.key(&fields[#indices]);
                        #json::write_json(&self.#members, encoder);
                    )*
                    encoder.end_object();
                }

                fn read_json(decoder: &mut JsonDecoder<'de>) -> Result<Self> {
                    #(let mut #slots: Option<#types> = None;)*
                    let fields = #table;
                    let mut more = decoder.begin_object()?;
                    while more {
                        #[allow(clippy::match_single_binding)]
                        match decoder.member_key(fields)? {
                            #(Some(#indices) => {
                                #slots = Some(#json::read_json(decoder)?);
                            })*
                            _ => decoder.skip_value()?,
                        }
                        more = decoder.iteration_check()?;
                    }
                    Ok(Self {
                        #(
                            #members: #slots.ok_or_else(|| missing_field(#keys))?,
                        )*
                    })
                }
            }
        };
    })
}
