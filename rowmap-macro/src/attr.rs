use convert_case::Case;
use syn::{
    ext::IdentExt, Attribute, Data, DeriveInput, Fields, FieldsNamed, LitInt, LitStr, Result,
};

/// Direction set by `#[bind(..)]`.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
    InOut,
}

#[derive(Default)]
pub struct BindAttr {
    pub direction: Option<Direction>,
    pub size: Option<usize>,
    pub rename: Option<String>,
    pub skip: bool,
}

#[derive(Default)]
pub struct RecordAttr {
    pub rename: Option<String>,
    pub skip: bool,
}

pub fn named_fields<'a>(input: &'a DeriveInput, derive: &str) -> &'a FieldsNamed {
    let Data::Struct(data) = &input.data else {
        abort!(input.ident, "Derive {} only available on struct", derive);
    };

    let Fields::Named(fields) = &data.fields else {
        abort!(input.ident, "Derive {} needs named fields", derive);
    };

    fields
}

pub fn field_name(ident: &syn::Ident) -> String {
    ident.unraw().to_string()
}

pub fn parse_bind(attrs: &[Attribute]) -> Result<BindAttr> {
    let mut bind = BindAttr::default();

    for attr in attrs.iter().filter(|attr| attr.path().is_ident("bind")) {
        attr.parse_nested_meta(|meta| {
            let direction = if meta.path.is_ident("input") {
                Some(Direction::In)
            } else if meta.path.is_ident("out") || meta.path.is_ident("output") {
                Some(Direction::Out)
            } else if meta.path.is_ident("inout") {
                Some(Direction::InOut)
            } else {
                None
            };

            if let Some(direction) = direction {
                if bind.direction.replace(direction).is_some() {
                    return Err(meta.error("direction is set more than once"));
                }

                return Ok(());
            }

            if meta.path.is_ident("size") {
                let lit: LitInt = meta.value()?.parse()?;
                bind.size = Some(lit.base10_parse()?);
                return Ok(());
            }

            if meta.path.is_ident("rename") {
                let lit: LitStr = meta.value()?.parse()?;
                bind.rename = Some(lit.value());
                return Ok(());
            }

            if meta.path.is_ident("skip") {
                bind.skip = true;
                return Ok(());
            }

            Err(meta.error("expected `input`, `out`, `inout`, `size`, `rename` or `skip`"))
        })?;
    }

    Ok(bind)
}

pub fn parse_record(attrs: &[Attribute]) -> Result<RecordAttr> {
    let mut record = RecordAttr::default();

    for attr in attrs.iter().filter(|attr| attr.path().is_ident("record")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                let lit: LitStr = meta.value()?.parse()?;
                record.rename = Some(lit.value());
                return Ok(());
            }

            if meta.path.is_ident("skip") {
                record.skip = true;
                return Ok(());
            }

            Err(meta.error("expected `rename` or `skip`"))
        })?;
    }

    Ok(record)
}

/// Reads `#[record(rename_all = "..")]` from the container.
pub fn parse_rename_all(attrs: &[Attribute]) -> Result<Option<Case>> {
    let mut case = None;

    for attr in attrs.iter().filter(|attr| attr.path().is_ident("record")) {
        attr.parse_nested_meta(|meta| {
            if !meta.path.is_ident("rename_all") {
                return Err(meta.error("expected `rename_all`"));
            }

            let lit: LitStr = meta.value()?.parse()?;
            let parsed = match lit.value().as_str() {
                "lowercase" => Case::Flat,
                "UPPERCASE" => Case::UpperFlat,
                "PascalCase" => Case::Pascal,
                "camelCase" => Case::Camel,
                "snake_case" => Case::Snake,
                "SCREAMING_SNAKE_CASE" => Case::UpperSnake,
                "kebab-case" => Case::Kebab,
                other => {
                    return Err(syn::Error::new_spanned(
                        &lit,
                        format!("unsupported rename_all case `{other}`"),
                    ))
                }
            };

            case = Some(parsed);

            Ok(())
        })?;
    }

    Ok(case)
}
