pub fn separated_by<T, F>(
    out: &mut String,
    values: impl IntoIterator<Item = T>,
    mut f: F,
    separator: &str,
) where
    F: FnMut(&mut String, T),
{
    let mut len = out.len();
    for v in values {
        if out.len() > len {
            out.push_str(separator);
        }
        len = out.len();
        f(out, v);
    }
}

/// Count of the `?` placeholders outside of quoted literals and identifiers.
pub fn count_placeholders(sql: &str) -> usize {
    let mut count = 0;
    for_each_placeholder(sql, |_| count += 1);
    count
}

/// Calls `f` with the byte position of every `?` placeholder that is not inside
/// a `'...'`, `"..."` or `` `...` `` quoted section.
pub fn for_each_placeholder(sql: &str, mut f: impl FnMut(usize)) {
    let mut quote: Option<char> = None;
    for (i, c) in sql.char_indices() {
        match quote {
            // A doubled quote reopens immediately, so toggling is enough
            Some(q) if c == q => quote = None,
            Some(..) => {}
            None => match c {
                '\'' | '"' | '`' => quote = Some(c),
                '?' => f(i),
                _ => {}
            },
        }
    }
}

/// Largest char boundary of `value` not greater than `index`.
pub fn floor_char_boundary(value: &str, index: usize) -> usize {
    if index >= value.len() {
        return value.len();
    }
    (0..=index)
        .rev()
        .find(|i| value.is_char_boundary(*i))
        .unwrap_or(0)
}

#[macro_export]
macro_rules! truncate_long {
    ($query:expr) => {
        format_args!(
            "{}{}",
            &$query[..$crate::floor_char_boundary(&$query, 497)].trim_end(),
            if $query.len() > 497 { "..." } else { "" },
        )
    };
}
