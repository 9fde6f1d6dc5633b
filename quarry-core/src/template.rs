use crate::{Error, ExecValue, FieldDef, Model, QueryError, Result, SqlWriter, separated_by};
use std::collections::HashMap;

/// Fragments available to a template skeleton.
///
/// `$ModelName` and `$Columns` default to the quoted table name and column
/// list of the model, the other tokens must be supplied with [`TemplateContext::with`].
#[derive(Debug, Clone)]
pub struct TemplateContext<'m> {
    model: &'m Model,
    fragments: HashMap<String, ExecValue>,
}

impl<'m> TemplateContext<'m> {
    pub fn new(model: &'m Model) -> Self {
        Self {
            model,
            fragments: HashMap::new(),
        }
    }
    /// Fragment substituted for `$<name>`.
    pub fn with(mut self, name: impl Into<String>, fragment: ExecValue) -> Self {
        self.fragments.insert(name.into(), fragment);
        self
    }
    pub fn model(&self) -> &Model {
        self.model
    }
    pub fn fragment(&self, name: &str) -> Option<&ExecValue> {
        self.fragments.get(name)
    }
}

const NAMED: [&str; 4] = ["ModelName", "Columns", "Values", "Conditions"];

fn unknown(token: &str) -> Error {
    QueryError::UnknownPlaceholder {
        token: token.into(),
    }
    .into()
}

/// Substitutes every `$` token of `skeleton` in one left to right pass.
///
/// * `$ModelName`, `$Columns`, `$Values`, `$Conditions`: named fragments.
/// * `$FN-<Field>`: column of the field with that name.
/// * `$0x<hex>`: column of the field at that byte offset.
/// * `$$`: a literal `$`.
///
/// The `?` of the skeleton consume its own arguments in order, substituted
/// fragments bring theirs. Quoted sections are copied untouched.
pub fn render(
    writer: &dyn SqlWriter,
    skeleton: &ExecValue,
    context: &TemplateContext,
) -> Result<ExecValue> {
    let sql = skeleton.sql();
    let mut own_args = skeleton.args().iter();
    let mut out = ExecValue::default();
    let mut quote: Option<char> = None;
    let mut chars = sql.char_indices().peekable();
    let mut position = 0;
    while let Some((i, c)) = chars.next() {
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' | '`' => quote = Some(c),
            '?' => {
                out.push(&sql[position..i], []);
                let arg = own_args.next().ok_or_else(|| {
                    Error::msg(format!(
                        "Template skeleton has more placeholders than its {} arguments",
                        skeleton.args().len()
                    ))
                })?;
                out.push("?", [arg.clone()]);
                position = i + 1;
            }
            '$' => {
                out.push(&sql[position..i], []);
                let rest = &sql[i + 1..];
                let length = token_length(rest);
                let token = &rest[..length];
                substitute(writer, context, token, &mut out)?;
                position = i + 1 + length;
                while chars.peek().is_some_and(|(j, _)| *j < position) {
                    chars.next();
                }
            }
            _ => {}
        }
    }
    out.push(&sql[position..], []);
    if own_args.next().is_some() {
        return Err(Error::msg(format!(
            "Template skeleton has {} arguments but fewer placeholders",
            skeleton.args().len()
        )));
    }
    Ok(out)
}

/// Length in bytes of the token following a `$`.
fn token_length(rest: &str) -> usize {
    if rest.starts_with('$') {
        return 1;
    }
    if let Some(hex) = rest.strip_prefix("0x") {
        return 2 + hex.chars().take_while(char::is_ascii_hexdigit).count();
    }
    let prefix = if rest.starts_with("FN-") { 3 } else { 0 };
    prefix
        + rest[prefix..]
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
            .count()
}

fn substitute(
    writer: &dyn SqlWriter,
    context: &TemplateContext,
    token: &str,
    out: &mut ExecValue,
) -> Result<()> {
    let model = context.model();
    let field: Option<&FieldDef> = if token == "$" {
        out.push("$", []);
        return Ok(());
    } else if let Some(hex) = token.strip_prefix("0x") {
        let offset = usize::from_str_radix(hex, 16).map_err(|_| unknown(&format!("${}", token)))?;
        model.field_by_offset(offset)
    } else if let Some(name) = token.strip_prefix("FN-") {
        model.field(name)
    } else if NAMED.contains(&token) {
        if let Some(fragment) = context.fragment(token) {
            out.push_exec(fragment.clone());
            return Ok(());
        }
        match token {
            "ModelName" => {
                writer.write_identifier_quoted(out.sql_mut(), model.name());
                return Ok(());
            }
            "Columns" => {
                separated_by(
                    out.sql_mut(),
                    model.fields(),
                    |out, v| writer.write_identifier_quoted(out, v.column_name()),
                    ", ",
                );
                return Ok(());
            }
            _ => None,
        }
    } else {
        None
    };
    let Some(field) = field else {
        return Err(unknown(&format!("${}", token)));
    };
    writer.write_identifier_quoted(out.sql_mut(), field.column_name());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GenericSqlWriter, ModelBuilder};

    #[test]
    fn token_lengths() {
        assert_eq!(token_length("$ rest"), 1);
        assert_eq!(token_length("0x1f,"), 4);
        assert_eq!(token_length("FN-Name)"), 7);
        assert_eq!(token_length("Columns)"), 7);
        assert_eq!(token_length(" nothing"), 0);
    }

    #[test]
    fn quoted_sections_untouched() {
        let model = ModelBuilder::new("notes").build();
        let skeleton = ExecValue::from("SELECT '$Values?' FROM $ModelName");
        let exec = render(&GenericSqlWriter::new(), &skeleton, &TemplateContext::new(&model))
            .expect("Quoted tokens are not substituted");
        assert_eq!(exec.sql(), r#"SELECT '$Values?' FROM "notes""#);
        assert!(exec.args().is_empty());
    }
}
