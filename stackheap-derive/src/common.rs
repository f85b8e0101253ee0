use {
    darling::{ast::Data, FromDeriveInput, FromField, FromMeta},
    syn::{parse_quote, Generics, Ident, Path, Type},
};

#[derive(FromField)]
#[darling(attributes(stackheap))]
pub(crate) struct Field {
    pub(crate) ident: Option<Ident>,
    pub(crate) ty: Type,
    /// JSON key override.
    #[darling(default)]
    pub(crate) key: Option<String>,
    /// JSON rendering override.
    #[darling(default)]
    pub(crate) json: JsonRendering,
}

/// How a field's value is rendered in JSON.
#[derive(FromMeta, Default, Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum JsonRendering {
    /// The field type's own `JsonField` impl.
    #[default]
    #[darling(rename = "default")]
    Default,
    /// A fixed byte array as an array of decimal numbers.
    #[darling(rename = "numbers")]
    Numbers,
}

impl Field {
    /// The field's JSON key: the override if set, else the field name in
    /// PascalCase.
    pub(crate) fn json_key(&self) -> String {
        match (&self.key, &self.ident) {
            (Some(key), _) => key.clone(),
            (None, Some(ident)) => pascal_case(&ident.to_string()),
            (None, None) => unreachable!("only named fields are supported"),
        }
    }
}

#[derive(FromDeriveInput)]
#[darling(attributes(stackheap), supports(struct_named))]
pub(crate) struct MessageArgs {
    pub(crate) ident: Ident,
    pub(crate) generics: Generics,
    pub(crate) data: Data<(), Field>,
    /// Path to the `stackheap` crate, for crates that rename it.
    #[darling(rename = "crate", default = "default_crate_name")]
    pub(crate) crate_name: Path,
}

fn default_crate_name() -> Path {
    parse_quote!(stackheap)
}

/// `quiddity_id` -> `QuiddityId`. A raw identifier's `r#` is dropped.
pub(crate) fn pascal_case(name: &str) -> String {
    let name = name.strip_prefix("r#").unwrap_or(name);
    let mut out = String::with_capacity(name.len());
    let mut upper = true;
    for ch in name.chars() {
        if ch == '_' {
            upper = true;
        } else if upper {
            out.extend(ch.to_uppercase());
            upper = false;
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pascal_case_keys() {
        assert_eq!(pascal_case("offset"), "Offset");
        assert_eq!(pascal_case("quiddity_id"), "QuiddityId");
        assert_eq!(pascal_case("r#type"), "Type");
        assert_eq!(pascal_case("_private__x"), "PrivateX");
        assert_eq!(pascal_case("already_Pascal"), "AlreadyPascal");
    }
}
